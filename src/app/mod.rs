pub mod barcode_feature;
pub mod feature_list_app;
pub mod views;

pub use barcode_feature::BarcodeFeature;
pub use feature_list_app::{Feature, FeatureListApp};
pub use views::barcode_view::BarcodeView;
