use crate::app::BarcodeFeature;
use crate::app::views::View;
use crate::common::{Frame, Rect, Size};
use crate::config::Settings;
use crate::error::AppError;
use crate::pipeline::{OverlayState, StatsSnapshot};
use egui::{Align2, Color32, CornerRadius, FontId, Stroke, StrokeKind, TextureOptions};
use tokio::runtime::Handle;

const OVERLAY_COLOR: Color32 = Color32::RED;
const OVERLAY_STROKE: f32 = 2.0;
const LABEL_FONT_SIZE: f32 = 18.0;

/// Live camera preview with the barcode overlay drawn on top.
pub struct BarcodeView {
    feature: Result<BarcodeFeature, AppError>,
    overlay: OverlayState,
    texture: Option<egui::TextureHandle>,
}

impl BarcodeView {
    pub fn open(settings: &Settings, runtime: Handle) -> Self {
        let feature = BarcodeFeature::start(settings, runtime);
        if let Err(e) = &feature {
            tracing::error!("Barcode detection unavailable: {}", e);
        }
        Self {
            feature,
            overlay: OverlayState::new(settings.overlay),
            texture: None,
        }
    }

    fn upload_frame(&mut self, ctx: &egui::Context, frame: &Frame) {
        let upright = frame.orientation().apply(frame.image()).to_rgb8();
        let color_image = egui::ColorImage::from_rgb(
            [upright.width() as usize, upright.height() as usize],
            upright.as_raw().as_slice(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("camera_preview", color_image, TextureOptions::LINEAR))
            }
        }
    }

    fn draw_stats(ui: &mut egui::Ui, stats: &StatsSnapshot) {
        ui.horizontal(|ui| {
            ui.label(format!("Frames: {}", stats.frames_received));
            ui.label(format!("Admitted: {}", stats.frames_admitted));
            ui.label(format!("Dropped: {}", stats.frames_dropped));
            ui.label(format!("Failed: {}", stats.detections_failed));
            ui.label(format!(
                "Last value: {}",
                stats.last_payload.as_deref().unwrap_or("-")
            ));
        });
    }
}

// Preview rectangles are relative to the preview area.
fn to_screen(area: egui::Rect, rect: Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        area.min + egui::vec2(rect.x, rect.y),
        egui::vec2(rect.width, rect.height),
    )
}

impl View for BarcodeView {
    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.heading("DetectBarcode");
        ui.separator();

        let feature = match &mut self.feature {
            Ok(feature) => feature,
            Err(e) => {
                ui.colored_label(OVERLAY_COLOR, format!("Camera unavailable: {}", e));
                return;
            }
        };

        feature.apply_overlay_updates(&mut self.overlay);
        let latest = feature.latest_frame();
        let stats = feature.stats();
        Self::draw_stats(ui, &stats);

        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
        let area = response.rect;
        let geometry = feature.update_layout(Size::new(area.width(), area.height()));
        if let Some(frame) = latest {
            self.upload_frame(ui.ctx(), &frame);
        }

        painter.rect_filled(area, CornerRadius::ZERO, Color32::BLACK);
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                to_screen(area, geometry.video_rect()),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        if let Some(frame) = self.overlay.frame() {
            painter.rect_stroke(
                to_screen(area, frame),
                CornerRadius::ZERO,
                Stroke::new(OVERLAY_STROKE, OVERLAY_COLOR),
                StrokeKind::Outside,
            );
        }
        if let Some((label, text)) = self.overlay.label() {
            painter.text(
                to_screen(area, label).left_center(),
                Align2::LEFT_CENTER,
                text,
                FontId::proportional(LABEL_FONT_SIZE),
                OVERLAY_COLOR,
            );
        }

        ui.ctx().request_repaint();
    }
}
