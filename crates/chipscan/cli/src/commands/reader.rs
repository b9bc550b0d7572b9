use chipscan_apdu_transport_pcsc::{PcscDeviceManager, PcscError, PcscReader};
use colored::Colorize;

/// List all available readers
pub(crate) fn list_readers(manager: &PcscDeviceManager) -> eyre::Result<()> {
    let readers = match manager.list_readers() {
        Ok(readers) => readers,
        Err(PcscError::NoReadersAvailable) => {
            println!("{}", "No readers found!".yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        let status = if reader.has_card() {
            "card present".green()
        } else {
            "no card".dimmed()
        };
        println!("{}. {} ({})", i + 1, reader.name(), status);
    }

    Ok(())
}

/// The configured reader, or the first one holding a card
pub(crate) fn resolve_reader(
    manager: &PcscDeviceManager,
    configured: Option<&str>,
) -> eyre::Result<PcscReader> {
    Ok(match configured {
        Some(name) => manager.find_reader(name)?,
        None => manager.find_reader_with_card()?,
    })
}
