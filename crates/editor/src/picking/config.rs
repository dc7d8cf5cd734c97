/// How the editor raises pick requests
#[derive(Clone, Debug, PartialEq)]
pub struct PickingConfig {
    /// Pick when the viewport image is clicked
    pub pick_on_click: bool,
    /// Pick at the hovered position when this key is pressed
    pub pick_key: Option<egui::Key>,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            pick_on_click: true,
            pick_key: Some(egui::Key::Num1),
        }
    }
}

impl PickingConfig {
    pub fn click_only() -> Self {
        Self {
            pick_key: None,
            ..Default::default()
        }
    }
}
