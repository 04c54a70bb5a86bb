use crate::config::leading_int;
use serde::Serialize;

/// Key in `-v` that expands to the `-c` resolutions.
pub const CUSTOM_KEY: &str = "custom";

/// Working height while laying out a full-page capture.
pub const LAYOUT_HEIGHT: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    /// `None` means a full-page capture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Viewport {
    pub const fn full_page(width: u32) -> Self {
        Self { width, height: None }
    }

    pub const fn fixed(width: u32, height: u32) -> Self {
        Self {
            width,
            height: Some(height),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height.is_none_or(|h| h > 0)
    }
}

pub const DEFAULT_VIEWPORTS: [(&str, Viewport); 4] = [
    ("s", Viewport::full_page(640)),
    ("m", Viewport::full_page(768)),
    ("l", Viewport::full_page(1024)),
    ("xl", Viewport::full_page(1440)),
];

fn default_viewport(key: &str) -> Option<Viewport> {
    DEFAULT_VIEWPORTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, viewport)| *viewport)
}

/// Parse `<width>x<height>`, case-insensitive. Anything else is `None`.
pub fn parse_custom_viewport(value: &str) -> Option<Viewport> {
    let value = value.to_lowercase();
    let parts: Vec<&str> = value.split('x').collect();
    let [width, height] = parts.as_slice() else {
        return None;
    };
    let width = u32::try_from(leading_int(width)?).ok()?;
    let height = u32::try_from(leading_int(height)?).ok()?;
    Some(Viewport::fixed(width, height)).filter(Viewport::is_valid)
}

/// Insertion-ordered viewport name → size mapping for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewportSet {
    entries: Vec<(String, Viewport)>,
}

impl ViewportSet {
    pub fn defaults() -> Self {
        let mut set = Self::default();
        for (name, viewport) in DEFAULT_VIEWPORTS {
            set.insert(name, viewport);
        }
        set
    }

    /// Merge requested keys and custom resolutions into the final set.
    ///
    /// With explicit keys, customs appear as `custom_<n>` and only when `custom` is
    /// requested. Without keys, every default is used and customs are appended as
    /// `custom<n>`. `n` is the 1-based position in `custom_resolutions`, so a
    /// malformed entry leaves a gap.
    pub fn resolve(requested: &[String], custom_resolutions: &[String]) -> Self {
        if requested.is_empty() {
            let mut set = Self::defaults();
            set.extend_custom(custom_resolutions, "custom");
            return set;
        }

        let mut set = Self::default();
        for key in requested {
            if let Some(viewport) = default_viewport(key) {
                set.insert(key.clone(), viewport);
            } else if key != CUSTOM_KEY {
                tracing::debug!("Skipping unknown viewport key: {}", key);
            }
            if key == CUSTOM_KEY {
                set.extend_custom(custom_resolutions, "custom_");
            }
        }
        set
    }

    fn extend_custom(&mut self, custom_resolutions: &[String], prefix: &str) {
        for (i, raw) in custom_resolutions.iter().enumerate() {
            match parse_custom_viewport(raw) {
                Some(viewport) => self.insert(format!("{}{}", prefix, i + 1), viewport),
                None => tracing::debug!("Dropping malformed custom resolution: {:?}", raw),
            }
        }
    }

    /// Insert or replace in place.
    pub fn insert(&mut self, name: impl Into<String>, viewport: Viewport) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = viewport,
            None => self.entries.push((name, viewport)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Viewport> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, viewport)| viewport)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Viewport)> {
        self.entries
            .iter()
            .map(|(name, viewport)| (name.as_str(), viewport))
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_custom_viewport() {
        assert_eq!(parse_custom_viewport("800x600"), Some(Viewport::fixed(800, 600)));
        assert_eq!(parse_custom_viewport("800X600"), Some(Viewport::fixed(800, 600)));
        assert_eq!(parse_custom_viewport("800"), None);
        assert_eq!(parse_custom_viewport("abcxdef"), None);
        assert_eq!(parse_custom_viewport("1x2x3"), None);
        assert_eq!(parse_custom_viewport("0x600"), None);
        assert_eq!(parse_custom_viewport("800x-1"), None);
    }

    #[test]
    fn test_defaults_with_custom_append_without_underscore() {
        let set = ViewportSet::resolve(&[], &strings(&["800x600"]));
        assert_eq!(set.names(), vec!["s", "m", "l", "xl", "custom1"]);
        assert_eq!(set.get("s"), Some(&Viewport::full_page(640)));
        assert_eq!(set.get("m"), Some(&Viewport::full_page(768)));
        assert_eq!(set.get("l"), Some(&Viewport::full_page(1024)));
        assert_eq!(set.get("xl"), Some(&Viewport::full_page(1440)));
        assert_eq!(set.get("custom1"), Some(&Viewport::fixed(800, 600)));
    }

    #[test]
    fn test_requested_keys_with_custom_use_underscore() {
        let set = ViewportSet::resolve(&strings(&["s", "custom"]), &strings(&["320x480"]));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("s"), Some(&Viewport::full_page(640)));
        assert_eq!(set.get("custom_1"), Some(&Viewport::fixed(320, 480)));
    }

    #[test]
    fn test_custom_key_without_resolutions_adds_nothing() {
        let set = ViewportSet::resolve(&strings(&["custom", "m"]), &[]);
        assert_eq!(set.names(), vec!["m"]);
    }

    #[test]
    fn test_customs_ignored_unless_requested() {
        let set = ViewportSet::resolve(&strings(&["xl"]), &strings(&["800x600"]));
        assert_eq!(set.names(), vec!["xl"]);
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let set = ViewportSet::resolve(&strings(&["xxl", "l"]), &[]);
        assert_eq!(set.names(), vec!["l"]);
    }

    #[test]
    fn test_malformed_custom_leaves_gap_in_numbering() {
        let set = ViewportSet::resolve(&[], &strings(&["bad", "1280x720"]));
        assert_eq!(set.names(), vec!["s", "m", "l", "xl", "custom2"]);
    }

    #[test]
    fn test_duplicate_keys_keep_first_position() {
        let set = ViewportSet::resolve(&strings(&["l", "s", "l"]), &[]);
        assert_eq!(set.names(), vec!["l", "s"]);
    }

    #[test]
    fn test_every_entry_is_valid() {
        let set = ViewportSet::resolve(
            &strings(&["s", "m", "custom"]),
            &strings(&["0x0", "10x10", "x", "99999999999x1"]),
        );
        assert!(set.iter().all(|(_, viewport)| viewport.is_valid()));
        assert_eq!(set.names(), vec!["s", "m", "custom_2"]);
    }
}
