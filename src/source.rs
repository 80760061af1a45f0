use crate::error::ScanfigError;
use crate::setting::Setting;

/// Somewhere setting values come from.
///
/// A source is initialised with the settings it is responsible for and then
/// asked to load them once. Loading sets whatever values it can find and
/// returns every failure together; settings it has no value for are left
/// alone.
pub trait Source {
    /// The name used in `from` tags.
    fn name(&self) -> &str;

    fn init(&mut self, settings: Vec<Setting>);

    fn load(&mut self) -> Result<(), ScanfigError>;

    /// Help text describing how to set values through this source.
    fn usage(&self) -> String;

    /// Arguments this source did not consume, if it deals in arguments.
    fn remaining_args(&self) -> Option<&[String]> {
        None
    }
}
