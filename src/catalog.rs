//! The scanned track list and its filtered, visible view.

use crate::library::Track;

/// All scanned tracks plus the subset matching the active keyword.
///
/// `visible` holds indices into `all`, in `all` order. An empty keyword shows
/// everything.
#[derive(Debug, Default)]
pub struct TrackCatalog {
    all: Vec<Track>,
    visible: Vec<usize>,
    keyword: String,
}

impl TrackCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        let visible = (0..tracks.len()).collect();
        Self {
            all: tracks,
            visible,
            keyword: String::new(),
        }
    }

    pub fn all(&self) -> &[Track] {
        &self.all
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn visible_track(&self, index: usize) -> Option<&Track> {
        self.visible.get(index).map(|&i| &self.all[i])
    }

    pub fn visible_names(&self) -> Vec<String> {
        self.visible
            .iter()
            .map(|&i| self.all[i].name.clone())
            .collect()
    }

    /// Filter by `keyword` and return the reconciled selection.
    ///
    /// Playback is not affected; only the visible view changes.
    pub fn search(&mut self, keyword: &str, selection: Option<usize>) -> Option<usize> {
        let previous = self.selected_track(selection);
        self.keyword = keyword.to_string();
        self.refilter();
        self.reconcile(previous.as_ref(), selection)
    }

    /// Swap in a fresh scan, keep the keyword and return the reconciled selection.
    pub fn replace(&mut self, tracks: Vec<Track>, selection: Option<usize>) -> Option<usize> {
        let previous = self.selected_track(selection);
        self.all = tracks;
        self.refilter();
        self.reconcile(previous.as_ref(), selection)
    }

    fn selected_track(&self, selection: Option<usize>) -> Option<Track> {
        selection.and_then(|i| self.visible_track(i)).cloned()
    }

    fn refilter(&mut self) {
        if self.keyword.is_empty() {
            self.visible = (0..self.all.len()).collect();
            return;
        }
        let needle = self.keyword.to_lowercase();
        self.visible = self
            .all
            .iter()
            .enumerate()
            .filter(|(_, t)| t.name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
    }

    fn reconcile(&self, previous: Option<&Track>, selection: Option<usize>) -> Option<usize> {
        if let Some(track) = previous
            && let Some(pos) = self
                .visible
                .iter()
                .position(|&i| self.all[i].path == track.path)
        {
            return Some(pos);
        }
        let old = selection?;
        if old >= self.visible.len() {
            return (!self.visible.is_empty()).then_some(0);
        }
        Some(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> TrackCatalog {
        TrackCatalog::new(
            names
                .iter()
                .map(|n| Track::from_path(format!("/music/{n}")))
                .collect(),
        )
    }

    #[test]
    fn empty_keyword_shows_everything() {
        let mut c = catalog(&["Alpha.mp3", "beta.mp3", "Gamma.flac"]);
        assert_eq!(c.visible_len(), 3);

        c.search("ALPHA", None);
        assert_eq!(c.visible_names(), vec!["Alpha.mp3"]);

        c.search("", None);
        assert_eq!(c.visible_names(), vec!["Alpha.mp3", "beta.mp3", "Gamma.flac"]);
        assert_eq!(c.keyword(), "");
    }

    #[test]
    fn search_matches_substrings_case_insensitively_in_scan_order() {
        let mut c = catalog(&["a-Mix.mp3", "b.mp3", "c-mix.ogg"]);
        c.search("MIX", None);
        assert_eq!(c.visible_names(), vec!["a-Mix.mp3", "c-mix.ogg"]);
        assert_eq!(c.visible_track(1).unwrap().name, "c-mix.ogg");
        assert!(c.visible_track(2).is_none());
    }

    #[test]
    fn keyword_whitespace_is_significant() {
        let mut c = catalog(&["one two.mp3", "onetwo.mp3"]);
        c.search(" two", None);
        assert_eq!(c.visible_names(), vec!["one two.mp3"]);
    }

    #[test]
    fn selection_follows_the_selected_track() {
        let mut c = catalog(&["a.mp3", "b.mp3", "c.mp3"]);
        assert_eq!(c.search("c", Some(2)), Some(0));
        assert_eq!(c.search("", Some(0)), Some(2));
    }

    #[test]
    fn selection_clears_when_nothing_matches() {
        let mut c = catalog(&["a.mp3", "b.mp3"]);
        assert_eq!(c.search("zzz-no-match", Some(1)), None);
        assert!(c.is_empty());
    }

    #[test]
    fn out_of_bounds_selection_falls_back_to_first_row() {
        let mut c = catalog(&["a1.mp3", "a2.mp3", "b.mp3"]);
        // "b.mp3" is filtered out and index 2 no longer exists.
        assert_eq!(c.search("a", Some(2)), Some(0));
    }

    #[test]
    fn in_bounds_selection_keeps_its_position() {
        let mut c = catalog(&["a1.mp3", "b.mp3", "a2.mp3", "a3.mp3"]);
        assert_eq!(c.search("a", Some(1)), Some(1));
    }

    #[test]
    fn no_selection_stays_unselected() {
        let mut c = catalog(&["a.mp3"]);
        assert_eq!(c.search("a", None), None);
    }

    #[test]
    fn replace_reapplies_keyword_and_tracks_selection() {
        let mut c = catalog(&["a-mix.mp3", "b.mp3"]);
        c.search("mix", None);

        let tracks = ["0-mix.mp3", "a-mix.mp3", "z.mp3"]
            .iter()
            .map(|n| Track::from_path(format!("/music/{n}")))
            .collect();
        assert_eq!(c.replace(tracks, Some(0)), Some(1));
        assert_eq!(c.visible_names(), vec!["0-mix.mp3", "a-mix.mp3"]);
        assert_eq!(c.all().len(), 3);
    }
}
