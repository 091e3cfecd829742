use crate::common::Rect;
use crate::config::OverlaySettings;
use tokio::sync::watch;

/// A UI transition produced by a completed detection. Published from the
/// detection context and applied on the presentation context.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OverlayCommand {
    Show { frame: Rect, text: String },
    #[default]
    Hide,
}

/// Latest-wins channel for overlay updates. Publishing never waits on the
/// presentation context, and only the newest command is retained.
pub fn overlay_channel() -> (watch::Sender<OverlayCommand>, watch::Receiver<OverlayCommand>) {
    watch::channel(OverlayCommand::Hide)
}

/// The two operations the pipeline needs from whatever draws the overlay.
pub trait PresentationSurface {
    fn show_overlay(&mut self, frame: Rect, text: &str);
    fn hide_overlay(&mut self);
}

/// Overlay box and label as the barcode view draws them.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    visible: bool,
    frame: Rect,
    label: Rect,
    text: String,
    style: OverlaySettings,
}

impl OverlayState {
    pub fn new(style: OverlaySettings) -> Self {
        Self {
            visible: false,
            frame: Rect::default(),
            label: Rect::default(),
            text: String::new(),
            style,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn frame(&self) -> Option<Rect> {
        self.visible.then_some(self.frame)
    }

    pub fn label(&self) -> Option<(Rect, &str)> {
        self.visible.then_some((self.label, self.text.as_str()))
    }

    fn label_rect(&self, frame: Rect) -> Rect {
        Rect::new(
            frame.x,
            frame.y - self.style.label_offset,
            self.style.label_width,
            self.style.label_height,
        )
    }
}

impl PresentationSurface for OverlayState {
    fn show_overlay(&mut self, frame: Rect, text: &str) {
        self.visible = true;
        self.frame = frame;
        self.label = self.label_rect(frame);
        self.text = text.to_string();
    }

    fn hide_overlay(&mut self) {
        self.visible = false;
        self.frame = Rect::default();
        self.label = Rect::default();
        self.text.clear();
    }
}

pub fn apply_command(surface: &mut impl PresentationSurface, command: OverlayCommand) {
    match command {
        OverlayCommand::Show { frame, text } => surface.show_overlay(frame, &text),
        OverlayCommand::Hide => surface.hide_overlay(),
    }
}

/// Applies the newest command if it has not been seen yet. Returns whether
/// the surface changed.
pub fn apply_latest(
    overlay_rx: &mut watch::Receiver<OverlayCommand>,
    surface: &mut impl PresentationSurface,
) -> bool {
    match overlay_rx.has_changed() {
        Ok(true) => {
            let command = overlay_rx.borrow_and_update().clone();
            apply_command(surface, command);
            true
        }
        Ok(false) => false,
        Err(_) => {
            tracing::debug!("Overlay command channel closed");
            false
        }
    }
}
