//! Boot session values handed to later stages

use super::DisplayVariant;
use crate::error::BootError;

/// File-name filter for a downstream overlay loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSessionPattern {
    key: &'static str,
    glob: &'static str,
}

impl BootSessionPattern {
    pub const fn new(key: &'static str, glob: &'static str) -> Self {
        Self { key, glob }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn glob(&self) -> &'static str {
        self.glob
    }

    /// Shell-style match: `*` is any run of characters, `?` exactly one
    pub fn matches(&self, name: &str) -> bool {
        let pattern = self.glob.as_bytes();
        let name = name.as_bytes();
        let (mut p, mut n) = (0, 0);
        let mut star: Option<(usize, usize)> = None;

        while n < name.len() {
            match pattern.get(p) {
                Some(b'*') => {
                    star = Some((p, n));
                    p += 1;
                }
                Some(&c) if c == b'?' || c == name[n] => {
                    p += 1;
                    n += 1;
                }
                _ => match star {
                    Some((star_p, star_n)) => {
                        p = star_p + 1;
                        n = star_n + 1;
                        star = Some((star_p, star_n + 1));
                    }
                    None => return false,
                },
            }
        }
        pattern[p..].iter().all(|&c| c == b'*')
    }
}

/// State of one boot, returned by the board stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootSession {
    pattern: Option<BootSessionPattern>,
    overlay: Option<DisplayVariant>,
}

impl BootSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pattern(&mut self, key: &'static str, glob: &'static str) {
        log::info!("{} = {}", key, glob);
        self.pattern = Some(BootSessionPattern::new(key, glob));
    }

    pub fn pattern(&self) -> Option<&BootSessionPattern> {
        self.pattern.as_ref()
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.pattern.filter(|p| p.key == key).map(|p| p.glob)
    }

    /// Record the variant whose overlay was merged; only one per boot
    pub fn record_overlay(&mut self, variant: DisplayVariant) -> Result<(), BootError> {
        if self.overlay.is_some() {
            return Err(BootError::OverlayAlreadyApplied);
        }
        self.overlay = Some(variant);
        Ok(())
    }

    pub fn overlay(&self) -> Option<DisplayVariant> {
        self.overlay
    }
}
