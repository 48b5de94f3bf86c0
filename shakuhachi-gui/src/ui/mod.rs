pub mod beat_indicator;
pub mod flute_diagram;
pub mod main_display;
