//! Editing a conversation: every edit is checked and layout-changing edits
//! restart the loop.

mod common;

use chat_animator::model::ProfileId;
use chat_animator::render::FixedAdvance;
use chat_animator::{
    AnimationConfig, Color, DriverState, Error, ImageHandle, Message, MessageContent, Session,
    SpeakerProfile,
};
use common::{fast_config, first_profile, headless, session_with_texts};
use image::{Rgba, RgbaImage};

/// Run far enough that bubbles are on screen.
fn advance(session: &mut Session<FixedAdvance>, frames: u64) {
    let mut out = headless();
    for _ in 0..frames {
        session.tick(&mut out);
    }
}

fn assert_restarted(session: &Session<FixedAdvance>) {
    assert_eq!(session.frame(), 0);
    assert_eq!(session.state(), DriverState::Reset);
    assert!(session.messages().iter().all(Message::is_parked));
}

#[test]
fn new_session_rejects_bad_config() {
    let config = AnimationConfig {
        frame_rate: 0.0,
        ..AnimationConfig::default()
    };
    let err = Session::new(config, FixedAdvance::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn message_edits_restart() {
    let mut session = session_with_texts(fast_config(), &["a", "b"]);

    advance(&mut session, 100);
    session.set_message_text(0, "changed").unwrap();
    assert_restarted(&session);
    assert_eq!(session.messages()[0].as_text(), Some("changed"));

    advance(&mut session, 100);
    let idx = session.new_message().unwrap();
    assert_eq!(idx, 2);
    assert_eq!(session.messages()[2].as_text(), Some(""));
    assert_restarted(&session);

    advance(&mut session, 100);
    let removed = session.remove_message(1).unwrap();
    assert_eq!(removed.as_text(), Some("b"));
    assert_eq!(session.messages().len(), 2);
    assert_restarted(&session);
}

#[test]
fn bad_indices_are_not_found() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    assert!(matches!(session.set_message_text(5, "x"), Err(Error::NotFound(_))));
    assert!(matches!(session.remove_message(1), Err(Error::NotFound(_))));
    assert!(matches!(session.set_entrance_frame(9, Some(1)), Err(Error::NotFound(_))));
    assert!(matches!(
        session.set_message_profile(0, ProfileId(u64::MAX)),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        session.add_message(Message::text("x", ProfileId(u64::MAX))),
        Err(Error::NotFound(_))
    ));
    assert_eq!(session.messages().len(), 1);
}

#[test]
fn new_message_needs_a_profile() {
    let mut session = Session::new(fast_config(), FixedAdvance::default()).unwrap();
    assert!(matches!(session.new_message(), Err(Error::InvalidScene(_))));
}

#[test]
fn new_message_uses_first_profile() {
    let mut session = session_with_texts(fast_config(), &[]);
    session.add_profile(SpeakerProfile::new("Chad", false));
    let idx = session.new_message().unwrap();
    assert_eq!(session.messages()[idx].profile, first_profile(&session));
}

#[test]
fn duplicate_copies_style_of_last_profile() {
    let mut session = session_with_texts(fast_config(), &[]);
    let first = first_profile(&session);
    session.profile_mut(first).unwrap().bubble_color = Color::rgb(0x21, 0x8a, 0xff);
    session.profile_mut(first).unwrap().alpha = 0.5;

    let copy = session.duplicate_last_profile();
    assert_ne!(copy, first);
    let copied = session.profile(copy).unwrap();
    assert_eq!(copied.bubble_color, Color::rgb(0x21, 0x8a, 0xff));
    assert_eq!(copied.alpha, 0.5);
    assert_eq!(session.profiles().len(), 2);
}

#[test]
fn removing_profile_reassigns_messages() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    let first = first_profile(&session);
    let chad = session.add_profile(SpeakerProfile::new("Chad", true));
    session.add_message(Message::text("from chad", chad)).unwrap();
    advance(&mut session, 150);

    let removed = session.remove_profile(chad).unwrap();
    assert_eq!(removed.name, "Chad");
    assert!(session.messages().iter().all(|m| m.profile == first));
    assert_restarted(&session);

    assert!(matches!(session.remove_profile(chad), Err(Error::NotFound(_))));
    assert!(matches!(session.remove_profile(first), Err(Error::InvalidScene(_))));
    assert_eq!(session.profiles().len(), 1);
}

#[test]
fn set_message_profile_moves_bubble() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    let me = session.add_profile(SpeakerProfile::new("Grump", true));
    session.set_message_profile(0, me).unwrap();
    assert_eq!(session.messages()[0].profile, me);
}

#[test]
fn image_messages_use_registered_pixels() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    let handle = ImageHandle::new("mem://wide");
    session
        .images_mut()
        .insert(handle.clone(), RgbaImage::from_pixel(400, 200, Rgba([1, 2, 3, 255])));
    session.set_message_image(0, handle.clone()).unwrap();
    assert_eq!(session.messages()[0].content, MessageContent::Image(handle.clone()));
    assert_eq!(session.images().natural_size(&handle), (400, 200));
}

#[test]
fn missing_avatar_is_tolerated() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    let first = first_profile(&session);
    session
        .set_profile_avatar(first, Some(ImageHandle::new("/definitely/not/here.png")))
        .unwrap();
    assert!(session.profile(first).unwrap().avatar.is_some());
    assert!(matches!(
        session.set_profile_avatar(ProfileId(u64::MAX), None),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn font_edit_updates_line_height() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    advance(&mut session, 100);
    session.set_font("30px serif").unwrap();
    assert_eq!(session.config().font.size_px, 30.0);
    assert!((session.config().line_height - 36.0).abs() < 1e-4);
    assert_restarted(&session);

    assert!(session.set_font("huge").is_err());
    assert_eq!(session.config().font.size_px, 30.0);
}

#[test]
fn invalid_config_edits_change_nothing() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    let before = session.config().clone();
    assert!(matches!(session.set_timing(0.0, 1.0, 1.0), Err(Error::InvalidConfig(_))));
    assert!(matches!(session.set_canvas_size(0, 100), Err(Error::InvalidConfig(_))));
    assert_eq!(session.config(), &before);

    session.set_timing(0.2, 0.3, 0.4).unwrap();
    assert_eq!(session.config().slide_duration, 0.2);
    session.set_canvas_size(400, 600).unwrap();
    assert_eq!(session.config().canvas.height, 600);
    session.set_manual_timing(true).unwrap();
    assert!(session.config().manual_timing);
}

#[test]
fn cosmetic_edits_do_not_restart() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    advance(&mut session, 90);
    session.set_background("#000000", 0.5).unwrap();
    assert_eq!(session.config().background.a, 128);
    session.set_show_avatars(false);
    assert_eq!(session.frame(), 90);
    assert!(session.set_background("nope", 1.0).is_err());
}

#[test]
fn toggling_names_changes_layout_next_frame() {
    let mut session = session_with_texts(fast_config(), &["a", "b"]);
    session.set_show_names(true);
    advance(&mut session, 200);
    let with_names = session.messages()[1].desired_position;
    session.set_show_names(false);
    advance(&mut session, 1);
    // The stack gets shorter, so the centred bottom bubble moves up.
    let without = session.messages()[1].desired_position;
    assert!(without < with_names);
}

#[test]
fn seek_clamps_to_loop_end() {
    let mut session = session_with_texts(fast_config(), &["a"]);
    let total = session.total_frames();
    let outcome = session.seek(10_000, &mut headless());
    assert!(outcome.is_finished());
    assert_eq!(session.frame(), 0);

    session.seek(total / 2, &mut headless());
    assert_eq!(session.frame(), total / 2 + 1);
}
