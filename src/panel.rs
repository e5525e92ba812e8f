//! The actuators driven by the presence state machine.
use core::convert::Infallible;

use ufmt::uWrite;

use crate::fader::Fader;

/// Output side of the device: the character display (written to through
/// [`uWrite`]), the bar graph, the buzzer and the shared brightness fader.
///
/// All methods complete synchronously before returning.
pub trait Panel: uWrite<Error = Infallible> {
    /// Clear the display and move the cursor home.
    fn clear(&mut self);

    /// Light the first `segments` segments of the bar graph, turning off all
    /// others.
    fn show_segments(&mut self, segments: u8);

    /// Sound the buzzer once.
    fn beep(&mut self);

    /// Keep the display content visible for `millis` milliseconds.
    fn hold(&mut self, millis: u16);

    /// Run `f` with exclusive access to the fader, which is shared with the
    /// breathing interrupt.
    fn with_fader<R>(&mut self, f: impl FnOnce(&mut Fader) -> R) -> R;

    /// Print `text` at the cursor position.
    fn print(&mut self, text: &str) {
        let _ = self.write_str(text);
    }
}
