pub mod barcode_view;

pub use barcode_view::BarcodeView;

pub trait View {
    fn draw(&mut self, ui: &mut egui::Ui);
}
