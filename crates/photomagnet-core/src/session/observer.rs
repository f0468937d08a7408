//! Notification of populated-image changes.

/// Receives the populated data URLs, in slot order, whenever they change.
pub trait SlotObserver {
    fn images_updated(&mut self, images: &[String]);
}

impl<F> SlotObserver for F
where
    F: FnMut(&[String]),
{
    fn images_updated(&mut self, images: &[String]) {
        self(images)
    }
}
