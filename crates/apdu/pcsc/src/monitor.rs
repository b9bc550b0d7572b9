//! Blocking monitor for card insertion and removal

use pcsc::{Context, ReaderState, State};
use std::collections::HashMap;
use std::ffi::CString;
use std::time::Duration;
use tracing::trace;

use crate::error::PcscError;
use crate::event::CardEvent;
use crate::reader::card_present;

/// Monitor for PC/SC card events
///
/// Each call to [`PcscMonitor::wait_for_card_events`] blocks until a reader
/// changes state or the timeout elapses. Transitions already reported are
/// remembered so the same insertion is never reported twice.
#[allow(missing_debug_implementations)]
pub struct PcscMonitor {
    /// PC/SC context
    context: Context,
    /// Last reported state and ATR per reader
    previous_states: HashMap<String, (bool, Vec<u8>)>,
}

impl PcscMonitor {
    /// Create a new monitor
    pub(crate) fn new(context: Context) -> Self {
        Self {
            context,
            previous_states: HashMap::new(),
        }
    }

    /// Wait for card events on one reader, or on every reader when `reader` is `None`
    ///
    /// A card already present the first time a reader is observed is reported
    /// as [`CardEvent::Inserted`]. An elapsed timeout yields an empty list.
    pub fn wait_for_card_events(
        &mut self,
        reader: Option<&str>,
        timeout: Duration,
    ) -> Result<Vec<CardEvent>, PcscError> {
        let mut reader_states = Vec::new();
        match reader {
            Some(name) => {
                let name = CString::new(name)
                    .map_err(|_| PcscError::ReaderNotFound(name.to_string()))?;
                reader_states.push(ReaderState::new(name, State::UNAWARE));
            }
            None => {
                let readers = match self.context.list_readers_owned() {
                    Ok(readers) => readers,
                    Err(pcsc::Error::NoReadersAvailable) => {
                        return Err(PcscError::NoReadersAvailable);
                    }
                    Err(e) => return Err(e.into()),
                };
                for name in readers {
                    reader_states.push(ReaderState::new(name, State::UNAWARE));
                }
            }
        }

        if reader_states.is_empty() {
            return Err(PcscError::NoReadersAvailable);
        }

        // Learn the present state first, then block until it changes
        self.context.get_status_change(None, &mut reader_states)?;
        let mut events = self.collect_events(&reader_states);
        if !events.is_empty() {
            return Ok(events);
        }

        for rs in &mut reader_states {
            rs.sync_current_state();
        }

        match self.context.get_status_change(Some(timeout), &mut reader_states) {
            Ok(()) => {}
            Err(pcsc::Error::Timeout) => return Ok(Vec::new()),
            Err(pcsc::Error::UnknownReader) => {
                return Err(PcscError::ReaderNotFound(
                    reader.unwrap_or_default().to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        events = self.collect_events(&reader_states);
        Ok(events)
    }

    /// Diff reader states against what was last reported
    fn collect_events(&mut self, reader_states: &[ReaderState]) -> Vec<CardEvent> {
        let observed = reader_states.iter().map(|rs| {
            let present = card_present(rs.event_state());
            let atr = if present { rs.atr().to_vec() } else { Vec::new() };
            (rs.name().to_string_lossy().into_owned(), present, atr)
        });
        diff_states(&mut self.previous_states, observed)
    }
}

/// Compare observed `(reader, present, atr)` triples with the previous ones
///
/// `previous` is updated with every reported transition.
fn diff_states(
    previous: &mut HashMap<String, (bool, Vec<u8>)>,
    observed: impl IntoIterator<Item = (String, bool, Vec<u8>)>,
) -> Vec<CardEvent> {
    let mut events = Vec::new();

    for (name, present, atr) in observed {
        let changed = match previous.get(&name) {
            Some((was_present, prev_atr)) => *was_present != present || *prev_atr != atr,
            // Don't report removal if we never saw it present
            None => present,
        };

        if !changed {
            previous.entry(name).or_insert((present, atr));
            continue;
        }

        trace!(reader = %name, present, "Reader state changed");

        if present {
            events.push(CardEvent::Inserted {
                reader: name.clone(),
                atr: atr.clone(),
            });
        } else {
            events.push(CardEvent::Removed {
                reader: name.clone(),
            });
        }
        previous.insert(name, (present, atr));
    }

    events
}
