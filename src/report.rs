//! Plain and styled text reports.

use crate::config::MeasureConfig;

/// Anything that renders as a text table.
///
/// `Display` gives the plain rendering; styled renderings carry ANSI color.
pub trait Report {
    /// Render, painting styles when `styled` is true.
    fn report(&self, styled: bool) -> String;

    /// Render with color markup.
    fn colorable_string(&self) -> String {
        self.report(true)
    }

    /// Render styled or plain per `config`.
    fn render(&self, config: &MeasureConfig) -> String {
        self.report(config.styled)
    }
}
