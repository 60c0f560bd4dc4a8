// Styling for the inline picker. Only the handful of SGR codes the frame uses;
// keep new roles here instead of sprinkling escape codes through the renderer.
const DIM: &str = "\x1b[2m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    /// Colour unless `NO_COLOR` is set.
    pub fn from_env() -> Self {
        if std::env::var_os("NO_COLOR").is_some() {
            Self::plain()
        } else {
            Self::ansi()
        }
    }

    pub fn ansi() -> Self {
        Self { enabled: true }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn dim(self, text: &str) -> String {
        self.paint(DIM, text)
    }

    pub fn warning(self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    pub fn selected(self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn paint(self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
