mod common;
use circlecam::FrameSource;
use common::*;

fn pool_player() -> Player {
    Player::new(Variant::PoolBall, Variant::PoolBall.default_tuning())
}

#[test]
fn test_nothing_reported_until_window_fills() {
    let mut scene = SyntheticScene::new(640, 480, 3, 5).still();
    let mut player = pool_player();

    for _ in 0..14 {
        let frame = scene.next_frame().unwrap().unwrap();
        let data = player.process_frame(frame).unwrap().data;
        assert!(data.circles.is_empty());
        assert_eq!(data.get_bool("stable"), Some(false));
    }
}

#[test]
fn test_still_balls_become_stable() {
    let mut scene = SyntheticScene::new(640, 480, 3, 5).still();
    let balls = scene.balls().to_vec();
    let mut player = pool_player();

    let mut last = None;
    for _ in 0..15 {
        let frame = scene.next_frame().unwrap().unwrap();
        last = Some(player.process_frame(frame).unwrap().data);
    }
    let data = last.unwrap();
    assert_eq!(data.get_bool("stable"), Some(true));
    assert!(!data.circles.is_empty(), "no stable circles");

    // stable circles are in cropped-frame coordinates
    for circle in &data.circles {
        let matched = balls.iter().any(|b| {
            centered_near(circle, b.x as u32 - 70, b.y as u32 - 70, 4)
        });
        assert!(matched, "unexpected circle {:?}", circle);
    }

    // the white half is the only part above the mask threshold
    for colored in data.colored.unwrap() {
        assert_eq!(colored.colors[0], Color::WHITE);
    }
}

#[test]
fn test_pool_ball_masks_table_cloth() {
    let mut scene = SyntheticScene::new(640, 480, 2, 11).still();
    let frame = scene.next_frame().unwrap().unwrap();
    let data = pool_player().process_frame(frame).unwrap().data;

    let masked = data.masked_frame.unwrap();
    let hsv_mask = data.hsv_mask.unwrap();
    assert_eq!(masked.dimensions(), (500, 340));
    // the cloth is blacked out, the balls are kept
    assert_eq!(masked.get_pixel(2, 2), &BLACK);
    assert_eq!(hsv_mask.get_pixel(2, 2)[0], 0);

    let ball = scene.balls()[0];
    let (x, y) = (ball.x as u32 - 70 + 5, ball.y as u32 - 70);
    assert_eq!(masked.get_pixel(x, y), &WHITE);
    assert_eq!(hsv_mask.get_pixel(x, y)[0], 255);
}

#[test]
fn test_tuning_change_applies_to_next_frame() {
    let frame = disk_frame(340, 240, &[]);
    let mut player = pool_player();
    player.process_frame(frame.clone()).unwrap();

    let mut tuning = *player.tuning();
    tuning.set(circlecam::SliderKey::HighV, 0);
    player.set_tuning(tuning);

    assert_eq!(player.tuning().hsv.high_v, 0);
    assert!(player.process_frame(frame).is_ok());
}

#[test]
fn test_low_dp_slider_still_finds_balls() {
    let mut scene = SyntheticScene::new(640, 480, 6, 5).still();
    let frame = scene.next_frame().unwrap().unwrap();

    let mut player = pool_player();
    let baseline = player.process_frame(frame.clone()).unwrap().data.detections.len();
    assert!(baseline > 0);

    for position in [1, 0] {
        let mut player = pool_player();
        let mut tuning = *player.tuning();
        tuning.set(circlecam::SliderKey::Dp, position);
        player.set_tuning(tuning);

        let detections = player.process_frame(frame.clone()).unwrap().data.detections;
        assert_eq!(detections.len(), baseline, "dp slider at {}", position);
    }
}
