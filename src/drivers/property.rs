/// Handle returned by [`Property::subscribe`]; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription(u64);
type Observer<T> = Box<dyn FnMut(&T)>;
/// Last known value of a device property plus the observers interested in it.
///
/// Updates are delivered synchronously, in registration order, on whatever
/// thread calls [`Property::update`]. The GUI owns every property, so
/// observers always run on the GUI thread.
pub struct Property<T> {
    value: Option<T>,
    observers: Vec<(Subscription, Observer<T>)>,
    next_id: u64,
}
impl<T> Default for Property<T> {
    fn default() -> Self {
        Self {
            value: None,
            observers: Vec::new(),
            next_id: 0,
        }
    }
}
impl<T> Property<T> {
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }
    pub fn subscribe(&mut self, observer: impl FnMut(&T) + 'static) -> Subscription {
        let handle = Subscription(self.next_id);
        self.next_id += 1;
        self.observers.push((handle, Box::new(observer)));
        handle
    }
    /// Returns false if the handle was not (or no longer) registered.
    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(h, _)| *h != handle);
        self.observers.len() != before
    }
    pub fn update(&mut self, value: T) {
        for (_, observer) in self.observers.iter_mut() {
            observer(&value);
        }
        self.value = Some(value);
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    #[test]
    fn observers_see_updates_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut prop = Property::default();
        let sink = seen.clone();
        prop.subscribe(move |v: &f64| sink.borrow_mut().push(*v));
        prop.update(1.0);
        prop.update(2.0);
        assert_eq!(*seen.borrow(), vec![1.0, 2.0]);
        assert_eq!(prop.get(), Some(&2.0));
    }
    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut prop = Property::default();
        let c = count.clone();
        let handle = prop.subscribe(move |_: &f64| *c.borrow_mut() += 1);
        prop.update(1.0);
        assert!(prop.unsubscribe(handle));
        prop.update(2.0);
        assert_eq!(*count.borrow(), 1);
        assert!(!prop.unsubscribe(handle));
    }
}
