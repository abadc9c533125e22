pub mod game;
pub mod knowledge;
pub mod model;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "cluesolver"
    }

    pub const fn backend_script() -> &'static str {
        "clue.cgi"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
