use crate::app::views::{BarcodeView, View};
use crate::config::Settings;
use crate::error::AppError;
use tokio::runtime::Handle;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    DetectBarcode,
}

impl Feature {
    pub const ALL: [Feature; 1] = [Feature::DetectBarcode];

    pub fn title(&self) -> &'static str {
        match self {
            Feature::DetectBarcode => "DetectBarcode",
        }
    }
}

/// Top-level window: the feature list on the left, the selected feature's view in the center.
pub struct FeatureListApp {
    settings: Settings,
    runtime: Handle,
    selected: Option<Feature>,
    active_view: Option<Box<dyn View>>,
}

impl FeatureListApp {
    pub fn new(settings: Settings, runtime: Handle) -> Self {
        Self {
            settings,
            runtime,
            selected: None,
            active_view: None,
        }
    }

    fn open_feature(&mut self, feature: Feature) {
        if self.selected == Some(feature) {
            return;
        }
        // Dropping the previous view stops its capture session.
        self.active_view = None;
        info!("Opening feature {}", feature.title());
        let view: Box<dyn View> = match feature {
            Feature::DetectBarcode => {
                Box::new(BarcodeView::open(&self.settings, self.runtime.clone()))
            }
        };
        self.active_view = Some(view);
        self.selected = Some(feature);
    }

    fn close_feature(&mut self) {
        if let Some(feature) = self.selected.take() {
            info!("Closing feature {}", feature.title());
        }
        self.active_view = None;
    }

    pub fn start_gui(settings: Settings, runtime: Handle) -> Result<(), AppError> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(egui::vec2(settings.window.width, settings.window.height))
                .with_title(settings.window.title.clone()),
            ..Default::default()
        };

        let title = settings.window.title.clone();
        eframe::run_native(
            &title,
            options,
            Box::new(move |_cc| Ok(Box::new(FeatureListApp::new(settings, runtime)))),
        )
        .map_err(|e| AppError::Ui(e.to_string()))
    }
}

impl eframe::App for FeatureListApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut requested = None;
        let mut close = false;

        egui::SidePanel::left("Features")
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Features");
                ui.separator();
                for feature in Feature::ALL {
                    if ui
                        .selectable_label(self.selected == Some(feature), feature.title())
                        .clicked()
                    {
                        requested = Some(feature);
                    }
                }
                if self.selected.is_some() {
                    ui.separator();
                    close = ui.button("Close").clicked();
                }
            });

        if close {
            self.close_feature();
        } else if let Some(feature) = requested {
            self.open_feature(feature);
        }

        egui::CentralPanel::default().show(ctx, |ui| match &mut self.active_view {
            Some(view) => view.draw(ui),
            None => {
                ui.label("Select a feature from the list.");
            }
        });
    }
}
