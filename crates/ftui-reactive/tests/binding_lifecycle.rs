//! End-to-end binding lifecycle through the public API.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use ftui_reactive::{Activation, BindError, Observable, ObservableConfig, UnbindError};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("capture lock")).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("capture lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn labelled(label: &str, value: i32) -> Observable<i32> {
    Observable::with_config(value, ObservableConfig::new().with_label(label))
}

#[test]
fn full_lifecycle() {
    let a = Observable::new(1);
    let b = Observable::new(2);
    let c = Observable::new(3);

    assert!(a.bind(&b));
    assert!(!a.bind(&c));

    a.set(8);
    assert_eq!(b.get(), 8);
    b.set(12);
    assert_eq!(a.get(), 12);

    assert!(b.unbind(&a));
    assert!(!a.unbind(&b));
    assert!(!b.unbind(&a));

    a.set(1);
    assert_eq!(b.get(), 12);

    assert!(a.bind(&c));
    c.set(99);
    assert_eq!(a.get(), 99);
    assert_eq!(b.get(), 12);
}

#[test]
fn typed_errors() {
    let a = Observable::new(0);
    let b = Observable::new(0);
    assert_eq!(a.try_unbind(&b), Err(UnbindError::NotBound));
    assert_eq!(a.try_bind(&b), Ok(()));
    assert_eq!(b.try_bind(&a), Err(BindError::AlreadyBound));
    assert_eq!(a.try_unbind(&b), Ok(()));
}

#[test]
fn observer_sees_binding_driven_changes_once() {
    let a = Observable::new(0);
    let b = Observable::new(0);
    assert!(a.bind(&b));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let handle = a.observe(Activation::Both, move |new, old| {
        sink.borrow_mut().push((*new, old.copied()));
    });

    b.set(5);
    assert_eq!(*seen.borrow(), vec![(5, None), (5, Some(0))]);

    assert!(a.remove(&handle));
    b.set(6);
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(a.get(), 6);
}

#[test]
fn dropped_peer_is_silently_forgotten() {
    let survivor = Observable::new(0);
    let peer = Observable::new(0);
    assert!(survivor.bind(&peer));
    drop(peer);

    assert!(!survivor.is_bound());
    survivor.set(4);
    assert_eq!(survivor.get(), 4);

    let fresh = Observable::new(0);
    assert!(survivor.bind(&fresh));
    fresh.set(7);
    assert_eq!(survivor.get(), 7);
}

#[test]
fn bind_and_unbind_are_logged_with_labels() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let left = labelled("left", 0);
        let right = labelled("right", 0);
        assert!(left.bind(&right));
        assert!(left.unbind(&right));
    });

    let out = capture.contents();
    assert!(out.contains("observables bound"), "log output: {out}");
    assert!(out.contains("observables unbound"), "log output: {out}");
    assert!(out.contains("left"), "log output: {out}");
    assert!(out.contains("right"), "log output: {out}");
}
