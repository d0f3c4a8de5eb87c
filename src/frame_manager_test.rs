use super::*;
use crate::frame::FrameIdGenerator;
use crate::types::Request;

fn waiting_frame(ids: &FrameIdGenerator) -> Frame {
    let (mut frame, _pending) = Frame::new(ids.next_id(), Request::default());
    frame.advance(FrameState::Waiting).unwrap();
    frame
}

#[test]
fn get_frame_returns_first_waiting_without_mutation() {
    let ids = FrameIdGenerator::new();
    let mut manager = FrameManager::default();
    let a = waiting_frame(&ids);
    let b = waiting_frame(&ids);
    let (a_id, b_id) = (a.id(), b.id());
    manager.add_frame(a);
    manager.add_frame(b);

    assert_eq!(manager.get_frame().map(Frame::id), Some(a_id));
    assert_eq!(manager.get_frame().map(Frame::id), Some(a_id));
    assert_eq!(manager.frame(a_id).unwrap().state(), FrameState::Waiting);

    manager.frame_mut(a_id).unwrap().advance(FrameState::Active).unwrap();
    assert_eq!(manager.get_frame().map(Frame::id), Some(b_id));
}

#[test]
fn get_frame_is_none_without_waiting_frames() {
    let ids = FrameIdGenerator::new();
    let mut manager = FrameManager::default();
    assert!(manager.get_frame().is_none());

    let mut frame = waiting_frame(&ids);
    frame.advance(FrameState::Active).unwrap();
    manager.add_frame(frame);
    assert!(manager.get_frame().is_none());
}

#[test]
fn classifies_by_state() {
    let ids = FrameIdGenerator::new();
    let mut manager = FrameManager::default();
    for i in 0..5 {
        let mut frame = waiting_frame(&ids);
        if i < 2 {
            frame.advance(FrameState::Active).unwrap();
        }
        manager.add_frame(frame);
    }

    assert_eq!(manager.get_active().len(), 2);
    assert_eq!(manager.get_waiting().len(), 3);
    assert_eq!(manager.active_count(), 2);
    assert_eq!(manager.waiting_count(), 3);
    assert!(manager.get_active().iter().all(|f| f.state() == FrameState::Active));
}

#[test]
fn views_are_detached() {
    let ids = FrameIdGenerator::new();
    let mut manager = FrameManager::default();
    manager.add_frame(waiting_frame(&ids));

    let mut view = manager.get_waiting();
    view.clear();
    assert_eq!(manager.waiting_count(), 1);
}

#[test]
fn add_respects_bound_and_remove_by_id() {
    let ids = FrameIdGenerator::new();
    let mut manager = FrameManager::new(FrameSet::bounded(1));
    let first = waiting_frame(&ids);
    let first_id = first.id();

    assert!(manager.add_frame(first));
    assert!(manager.is_full());
    assert!(!manager.add_frame(waiting_frame(&ids)));
    assert_eq!(manager.len(), 1);

    assert_eq!(manager.remove_frame(first_id).map(|f| f.id()), Some(first_id));
    assert!(manager.is_empty());
    assert!(manager.remove_frame(first_id).is_none());
}
