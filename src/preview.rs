//! Full size image preview shown over the feed

use crate::core::{ImageId, ImageRecord};

pub const PREVIEW_MAX_WIDTH: u32 = 900;
pub const PREVIEW_MIN_HEIGHT: u32 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewView {
    pub image_src: String,
    pub max_width: u32,
    pub min_height: u32,
    /// 打开原图
    pub original: Link,
}

/// Stateless overlay; the owner decides whether it is open and closes it.
pub struct ImagePreview;

impl ImagePreview {
    pub fn render(is_open: bool, image_url: &str) -> Option<PreviewView> {
        if !is_open {
            return None;
        }

        Some(PreviewView {
            image_src: image_url.to_string(),
            max_width: PREVIEW_MAX_WIDTH,
            min_height: PREVIEW_MIN_HEIGHT,
            original: Link {
                href: image_url.to_string(),
                label: "Open original",
            },
        })
    }
}

/// Cards of the feed, owning which one is previewed
#[derive(Debug, Clone, Default)]
pub struct CardList {
    cards: Vec<ImageRecord>,
    selected_url: Option<String>,
}

impl CardList {
    pub fn new(cards: Vec<ImageRecord>) -> Self {
        Self {
            cards,
            selected_url: None,
        }
    }

    pub fn cards(&self) -> &[ImageRecord] {
        &self.cards
    }

    /// Replace the cards, e.g. after another page was loaded. An open
    /// preview stays open.
    pub fn set_cards(&mut self, cards: Vec<ImageRecord>) {
        self.cards = cards;
    }

    /// Open the preview of the card with `id`. Returns false for an unknown id.
    pub fn open(&mut self, id: &ImageId) -> bool {
        match self.cards.iter().find(|card| &card.id == id) {
            Some(card) => {
                self.selected_url = Some(card.url.clone());
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self) {
        self.selected_url = None;
    }

    pub fn is_open(&self) -> bool {
        self.selected_url.is_some()
    }

    pub fn preview(&self) -> Option<PreviewView> {
        ImagePreview::render(self.is_open(), self.selected_url.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn test_closed_renders_nothing() {
        assert_eq!(ImagePreview::render(false, "https://i.test/a.png"), None);
    }

    #[test]
    fn test_open_renders_image_and_link() {
        let view = ImagePreview::render(true, "https://i.test/a.png").unwrap();

        assert_eq!(view.image_src, "https://i.test/a.png");
        assert_eq!(view.original.href, "https://i.test/a.png");
        assert_eq!(view.original.label, "Open original");
        assert_eq!(view.max_width, 900);
        assert_eq!(view.min_height, 600);
    }

    #[test]
    fn test_card_list_open_and_close() {
        let mut cards = CardList::new(vec![record("a"), record("b")]);
        assert!(cards.preview().is_none());

        assert!(cards.open(&ImageId::new("b")));
        assert_eq!(cards.preview().unwrap().image_src, "https://i.test/b.png");

        cards.set_cards(vec![record("a"), record("b"), record("c")]);
        assert!(cards.is_open());

        cards.close();
        assert!(cards.preview().is_none());
    }

    #[test]
    fn test_card_list_unknown_id() {
        let mut cards = CardList::new(vec![record("a")]);
        assert!(!cards.open(&ImageId::new("zzz")));
        assert!(!cards.is_open());
    }
}
