//! Command output.
//!
//! The engine produces abstract [`Command`]s; a [`CommandSink`] turns each one
//! into a discrete press-then-release pulse on some device. The X11 sink
//! injects key and button events through the XTEST extension.

use crate::{
    constants::{
        SCREEN_OFF_BUTTON, SCREEN_ON_BUTTON, XF86XK_AUDIO_NEXT, XF86XK_AUDIO_PREV, XK_PAGE_DOWN,
        XK_PAGE_UP,
    },
    error::{AppError, Result},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use x11rb::{
    connection::Connection,
    protocol::{
        xproto::{
            ConnectionExt as _, Screen, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT, KEY_PRESS_EVENT,
            KEY_RELEASE_EVENT,
        },
        xtest::ConnectionExt as _,
    },
    rust_connection::RustConnection,
};

/// Abstract reader command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    NextPage,
    PrevPage,
    NextItem,
    PrevItem,
    ScreenOff,
    ScreenOn,
}

impl Command {
    /// All commands, in declaration order
    pub const ALL: [Self; 6] = [
        Self::NextPage,
        Self::PrevPage,
        Self::NextItem,
        Self::PrevItem,
        Self::ScreenOff,
        Self::ScreenOn,
    ];

    /// Whether this command controls the screen rather than the document
    #[must_use]
    pub const fn is_power(self) -> bool {
        matches!(self, Self::ScreenOff | Self::ScreenOn)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NextPage => "NEXT PAGE",
            Self::PrevPage => "PREV PAGE",
            Self::NextItem => "NEXT ITEM",
            Self::PrevItem => "PREV ITEM",
            Self::ScreenOff => "SCREEN OFF",
            Self::ScreenOn => "SCREEN ON",
        };
        f.write_str(name)
    }
}

/// Receiver of dispatched commands
pub trait CommandSink {
    /// Deliver one command as a discrete pulse
    fn send(&mut self, command: Command) -> Result<()>;

    /// Discard any input queued downstream without acting on it.
    /// Returns the number of discarded events.
    fn drain_pending(&mut self) -> Result<usize>;

    /// Short name for logging
    fn name(&self) -> &str;
}

impl<T: CommandSink + ?Sized> CommandSink for Box<T> {
    fn send(&mut self, command: Command) -> Result<()> {
        (**self).send(command)
    }

    fn drain_pending(&mut self) -> Result<usize> {
        (**self).drain_pending()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Writes commands to the log only
#[derive(Debug, Default)]
pub struct LogSink {
    sent: usize,
}

impl LogSink {
    #[must_use]
    pub const fn new() -> Self {
        Self { sent: 0 }
    }

    /// Commands logged so far
    #[must_use]
    pub const fn sent(&self) -> usize {
        self.sent
    }
}

impl CommandSink for LogSink {
    fn send(&mut self, command: Command) -> Result<()> {
        self.sent += 1;
        info!("Command: {command}");
        Ok(())
    }

    fn drain_pending(&mut self) -> Result<usize> {
        debug!("Nothing to drain");
        Ok(0)
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// In-memory sink that records everything it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Vec<Command>,
    drains: usize,
    pending: usize,
    fail_sends: bool,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `send` fail until cleared
    pub fn set_failing(&mut self, failing: bool) {
        self.fail_sends = failing;
    }

    /// Simulate `count` events queued downstream
    pub fn queue_pending(&mut self, count: usize) {
        self.pending += count;
    }

    /// Commands delivered successfully, in order
    #[must_use]
    pub fn sent(&self) -> &[Command] {
        &self.sent
    }

    /// Number of `drain_pending` calls
    #[must_use]
    pub const fn drains(&self) -> usize {
        self.drains
    }

    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, command: Command) -> Result<()> {
        if self.fail_sends {
            return Err(AppError::Sink(format!("device unavailable for {command}")));
        }
        self.sent.push(command);
        Ok(())
    }

    fn drain_pending(&mut self) -> Result<usize> {
        self.drains += 1;
        Ok(std::mem::take(&mut self.pending))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Physical event a command is mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pulse {
    Key(u8),
    Button(u8),
}

/// X11 sink: fakes key and button presses through XTEST
pub struct X11CommandSink {
    connection: RustConnection,
    screen: Screen,
    pulses: HashMap<Command, Pulse>,
}

impl X11CommandSink {
    /// Connect to the default display and resolve keycodes for every command
    pub fn new() -> Result<Self> {
        info!("Initializing X11 command sink");

        let (connection, screen_num) = RustConnection::connect(None)
            .map_err(|e| AppError::X11(format!("Failed to connect to X11: {e}")))?;

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| AppError::X11("Failed to get screen".to_string()))?
            .clone();

        let version = connection
            .xtest_get_version(2, 2)
            .map_err(|e| AppError::X11(format!("XTEST extension unavailable: {e}")))?
            .reply()
            .map_err(|e| AppError::X11(format!("Failed to query XTEST version: {e}")))?;
        debug!("XTEST {}.{}", version.major_version, version.minor_version);

        let keysyms = [
            (Command::NextPage, XK_PAGE_DOWN),
            (Command::PrevPage, XK_PAGE_UP),
            (Command::NextItem, XF86XK_AUDIO_NEXT),
            (Command::PrevItem, XF86XK_AUDIO_PREV),
        ];
        let mut pulses = HashMap::new();
        for (command, keysym) in keysyms {
            let keycode = Self::keycode_for(&connection, keysym)?;
            debug!("{command} -> keycode {keycode}");
            pulses.insert(command, Pulse::Key(keycode));
        }
        pulses.insert(Command::ScreenOff, Pulse::Button(SCREEN_OFF_BUTTON));
        pulses.insert(Command::ScreenOn, Pulse::Button(SCREEN_ON_BUTTON));

        info!(
            "Connected to X11 display, screen: {}x{}",
            screen.width_in_pixels, screen.height_in_pixels
        );

        Ok(Self {
            connection,
            screen,
            pulses,
        })
    }

    fn keycode_for(connection: &RustConnection, keysym: u32) -> Result<u8> {
        let setup = connection.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let mapping = connection
            .get_keyboard_mapping(min, max - min + 1)
            .map_err(|e| AppError::X11(format!("Failed to request keyboard mapping: {e}")))?
            .reply()
            .map_err(|e| AppError::X11(format!("Failed to get keyboard mapping: {e}")))?;

        let per_keycode = usize::from(mapping.keysyms_per_keycode.max(1));
        mapping
            .keysyms
            .chunks(per_keycode)
            .position(|syms| syms.contains(&keysym))
            .and_then(|offset| u8::try_from(offset).ok())
            .map(|offset| min + offset)
            .ok_or_else(|| AppError::X11(format!("No keycode for keysym {keysym:#x}")))
    }

    fn fake(&self, event_type: u8, detail: u8) -> Result<()> {
        self.connection
            .xtest_fake_input(event_type, detail, x11rb::CURRENT_TIME, self.screen.root, 0, 0, 0)
            .map_err(|e| AppError::X11(format!("Failed to fake input: {e}")))?;
        Ok(())
    }
}

impl CommandSink for X11CommandSink {
    fn send(&mut self, command: Command) -> Result<()> {
        let pulse = self
            .pulses
            .get(&command)
            .copied()
            .ok_or_else(|| AppError::Sink(format!("No mapping for {command}")))?;

        match pulse {
            Pulse::Key(keycode) => {
                self.fake(KEY_PRESS_EVENT, keycode)?;
                self.fake(KEY_RELEASE_EVENT, keycode)?;
            }
            Pulse::Button(button) => {
                self.fake(BUTTON_PRESS_EVENT, button)?;
                self.fake(BUTTON_RELEASE_EVENT, button)?;
            }
        }

        self.connection
            .flush()
            .map_err(|e| AppError::X11(format!("Failed to flush connection: {e}")))?;

        debug!("Sent {command} as {pulse:?}");
        Ok(())
    }

    /// An XTEST client only injects input and holds no event queue of its
    /// own. Draining waits for the server to process every request sent so
    /// far, then discards whatever the connection has queued in return
    /// (errors for dropped requests, stray events).
    fn drain_pending(&mut self) -> Result<usize> {
        self.connection
            .get_input_focus()
            .map_err(|e| AppError::X11(format!("Failed to sync with server: {e}")))?
            .reply()
            .map_err(|e| AppError::X11(format!("Failed to sync with server: {e}")))?;

        let mut drained = 0;
        while self
            .connection
            .poll_for_event()
            .map_err(|e| AppError::X11(format!("Failed to poll events: {e}")))?
            .is_some()
        {
            drained += 1;
        }
        if drained > 0 {
            warn!("Discarded {drained} events queued while asleep");
        }
        Ok(drained)
    }

    fn name(&self) -> &str {
        "x11"
    }
}

/// Sink selection by name
pub fn create_sink(name: &str) -> Result<Box<dyn CommandSink>> {
    match name {
        "x11" => Ok(Box::new(X11CommandSink::new()?)),
        "log" => Ok(Box::new(LogSink::new())),
        _ => Err(AppError::InvalidInput(format!("Unknown command sink: {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serde_names() {
        let yaml = serde_yaml::to_string(&Command::NextPage).unwrap();
        assert_eq!(yaml.trim(), "next_page");
        let parsed: Command = serde_yaml::from_str("screen_off").unwrap();
        assert_eq!(parsed, Command::ScreenOff);
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::PrevItem.to_string(), "PREV ITEM");
        assert!(Command::ScreenOn.is_power());
        assert!(!Command::NextPage.is_power());
        assert_eq!(Command::ALL.iter().filter(|c| c.is_power()).count(), 2);
    }

    #[test]
    fn test_recording_sink() {
        let mut sink = RecordingSink::new();
        sink.send(Command::NextPage).unwrap();
        sink.queue_pending(4);
        assert_eq!(sink.drain_pending().unwrap(), 4);
        assert_eq!(sink.drain_pending().unwrap(), 0);
        assert_eq!(sink.drains(), 2);

        sink.set_failing(true);
        assert!(matches!(sink.send(Command::PrevPage), Err(AppError::Sink(_))));
        assert_eq!(sink.sent(), &[Command::NextPage]);
    }

    #[test]
    fn test_unknown_sink_rejected() {
        assert!(matches!(create_sink("uinput"), Err(AppError::InvalidInput(_))));
        let sink = create_sink("log").unwrap();
        assert_eq!(sink.name(), "log");
    }
}
