use std::time::Duration;

use chipscan::{Error, ScanResult, Scanner, VerificationClient};
use chipscan_apdu_core::{CardTransportFactory, TransportError};
use chipscan_apdu_transport_pcsc::{CardEvent, PcscDeviceManager, PcscTransport};
use colored::Colorize;
use tracing::{info, warn};

use super::reader::resolve_reader;
use crate::config::Config;

/// How long one wait for card events blocks
const EVENT_POLL: Duration = Duration::from_secs(1);

/// Print a completed scan
fn report(result: &ScanResult) {
    if result.recognized() {
        println!("uid: {} ({})", result.uid(), result.device_family());
        println!("check-result: {}", result.verdict().unwrap_or_default().bold());
        println!("result data: {}", result.result_data().unwrap_or_default());
    } else {
        println!("uid: {}", result.uid());
        println!("{}", result.to_string().yellow());
    }
}

fn report_error(error: &Error) {
    println!("{} {error}", "error:".red().bold());
}

fn open_with(
    manager: &PcscDeviceManager,
) -> impl Fn(&str) -> Result<PcscTransport, TransportError> + '_ {
    move |reader: &str| manager.open(reader)
}

/// Scan the card on the configured reader once
pub(crate) fn scan_once(manager: &PcscDeviceManager, config: &Config) -> eyre::Result<()> {
    let reader = resolve_reader(manager, config.reader.as_deref())?;
    info!("Using reader: {}", reader.name());

    let service = VerificationClient::new(&config.client_config())?;
    let scanner =
        Scanner::with_service(config.api_key()?, reader.name(), open_with(manager), service)
            .with_registry(config.registry()?);

    let result = scanner.scan()?;
    report(&result);
    Ok(())
}

/// Scan on every card insertion until the process is interrupted
///
/// Scans run one at a time on this thread. Insertions that happen while a
/// scan is running are seen on the next wait.
pub(crate) fn watch(manager: &PcscDeviceManager, config: &Config) -> eyre::Result<()> {
    let api_key = config.api_key()?;
    let registry = config.registry()?;
    let service = VerificationClient::new(&config.client_config())?;
    let mut monitor = manager.monitor();

    match config.reader.as_deref() {
        Some(reader) => println!("Waiting for cards on {reader} (Ctrl-C to stop)"),
        None => println!("Waiting for cards on any reader (Ctrl-C to stop)"),
    }

    loop {
        let events = monitor.wait_for_card_events(config.reader.as_deref(), EVENT_POLL)?;

        for event in events {
            let (reader, atr) = match event {
                CardEvent::Inserted { reader, atr } => (reader, atr),
                CardEvent::Removed { reader } => {
                    info!(reader = %reader, "Card removed");
                    continue;
                }
            };
            info!(reader = %reader, atr = %chipscan::to_hex(&atr), "Card inserted");

            let scanner =
                Scanner::with_service(api_key, reader.as_str(), open_with(manager), &service)
                    .with_registry(registry.clone());
            match scanner.scan() {
                Ok(result) => report(&result),
                Err(e) => {
                    warn!(error = %e, "Scan failed");
                    report_error(&e);
                }
            }
        }
    }
}
