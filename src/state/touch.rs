// Touch/pinch gesture bookkeeping used to turn raw TouchEvents into
// viewport InputEvents.
#[derive(Default, Debug, Clone)]
pub struct TouchState {
    pub single_active: bool,
    pub pinch: bool,
    pub last_pinch_dist: f64,
}

impl TouchState {
    pub fn clear(&mut self) {
        self.single_active = false;
        self.pinch = false;
        self.last_pinch_dist = 0.0;
    }
}
