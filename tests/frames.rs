mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use glmux::FrameDriver;
use pretty_assertions::assert_eq;

#[test]
fn every_frame_callback_is_followed_by_a_flush() {
    let vz = virtualizer();
    let driver = FrameDriver::new(vz.clone());
    let (ma, sa) = surface(4, 4);
    let (mb, sb) = surface(4, 4);
    let a = context(&vz, &sa, "webgl2");
    let b = context(&vz, &sb, "webgl2");
    let flat = Rc::new(flat_program(&a));

    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let (a, flat, seen, ma) = (a.clone(), Rc::clone(&flat), Rc::clone(&seen), Rc::clone(&ma));
        driver.request_animation_frame(move |_| {
            draw_point(&a, &flat, 0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
            seen.borrow_mut().push(ma.presents());
        });
    }
    {
        let (b, flat, seen, ma) = (b.clone(), Rc::clone(&flat), Rc::clone(&seen), Rc::clone(&ma));
        driver.request_animation_frame(move |_| {
            // The first callback's frame has already been presented.
            seen.borrow_mut().push(ma.presents());
            draw_point(&b, &flat, 0.0, 0.0, [0.0, 1.0, 0.0, 1.0]);
        });
    }

    let report = driver.tick(16.0);
    assert_eq!(report.composited, vec![a.id(), b.id()]);
    assert_eq!(*seen.borrow(), vec![0, 1]);
    assert_eq!(ma.pixel(2, 1), Some(RED));
    assert_eq!(mb.pixel(2, 1), Some(GREEN));
    assert!(!vz.is_flush_pending());
    assert_eq!(vz.current_context(), None);
}

#[test]
fn a_callback_cancelled_during_the_tick_is_skipped() {
    let vz = virtualizer();
    let driver = FrameDriver::new(vz);
    let log = Rc::new(RefCell::new(Vec::new()));

    let second = {
        let first_log = Rc::clone(&log);
        let cancel = Rc::new(RefCell::new(None));
        let (inner, target) = (driver.clone(), Rc::clone(&cancel));
        driver.request_animation_frame(move |_| {
            first_log.borrow_mut().push("first");
            if let Some(id) = target.borrow_mut().take() {
                assert!(inner.cancel_animation_frame(id));
            }
        });
        let second_log = Rc::clone(&log);
        let id = driver.request_animation_frame(move |_| second_log.borrow_mut().push("second"));
        *cancel.borrow_mut() = Some(id);
        id
    };

    driver.tick(0.0);
    assert_eq!(*log.borrow(), vec!["first"]);
    assert!(!driver.cancel_animation_frame(second));
}
