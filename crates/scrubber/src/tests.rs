//! Properties checked across parser, engine and timeline on seeded random
//! animations.

use std::sync::Arc;

use image::RgbaImage;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::render::RenderShared;
use crate::test_util::{raw_indices, FakeDecoder, GifBuilder};
use crate::{
    parse, CompositeEngine, DisposalMethod, Error, Malformation, Retention, Session,
    TimelineOptions,
};

const PALETTE: [[u8; 3]; 4] = [[0, 0, 0], [200, 0, 0], [0, 200, 0], [0, 0, 200]];

fn random_gif(rng: &mut StdRng) -> Vec<u8> {
    let width: u16 = rng.random_range(1..=6);
    let height: u16 = rng.random_range(1..=6);
    let frames = rng.random_range(1..=12);

    let mut builder = GifBuilder::new(width, height).palette(&PALETTE);
    for _ in 0..frames {
        let x = rng.random_range(0..width);
        let y = rng.random_range(0..height);
        let w = rng.random_range(1..=width - x);
        let h = rng.random_range(1..=height - y);

        let disposal = DisposalMethod::from_bits(rng.random_range(0..4));
        let transparent = rng.random_bool(0.4).then(|| rng.random_range(0..4));
        builder = builder.control(disposal, rng.random_range(0..20), transparent);

        let indices: Vec<u8> = (0..usize::from(w) * usize::from(h))
            .map(|_| rng.random_range(0..4))
            .collect();
        builder = builder.frame(x, y, w, h, &raw_indices(&indices));
    }
    builder.build()
}

fn engine(bytes: &[u8], retention: Retention, interval: usize) -> CompositeEngine {
    let container = Arc::new(parse(bytes).unwrap());
    let shared = RenderShared::new(container.assumes_transparency);
    CompositeEngine::new(
        container,
        Arc::new(FakeDecoder::default()),
        shared,
        retention,
        interval,
    )
}

fn sequential(bytes: &[u8]) -> Vec<RgbaImage> {
    let mut engine = engine(bytes, Retention::KeyFrames, usize::MAX);
    (0..engine.frame_count())
        .map(|n| RgbaImage::clone(&engine.composite(n).unwrap()))
        .collect()
}

#[test]
fn accepted_frames_fit_the_canvas() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let container = parse(&random_gif(&mut rng)).unwrap();
        let (width, height) = container.canvas_size();
        assert!(container.frames.iter().all(|frame| frame.fits(width, height)));
    }
}

#[test]
fn keyframe_replay_matches_sequential_replay() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let bytes = random_gif(&mut rng);
        let expected = sequential(&bytes);
        let count = expected.len();

        for interval in 1..=count {
            for retention in [Retention::KeyFrames, Retention::All] {
                let mut keyed = engine(&bytes, retention, interval);
                for _ in 0..count * 2 {
                    let n = rng.random_range(0..count);
                    let canvas = keyed.composite(n).unwrap();
                    assert_eq!(&*canvas, &expected[n], "frame {n}, interval {interval}");
                }
            }
        }
    }
}

#[test]
fn session_seeks_are_idempotent() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..10 {
        let bytes = random_gif(&mut rng);
        let expected = sequential(&bytes);

        let mut session = Session::load(
            &bytes,
            Arc::new(FakeDecoder::default()),
            TimelineOptions::default().key_frame_interval(3),
        )
        .unwrap();

        for _ in 0..30 {
            let n = rng.random_range(0..expected.len());
            assert_eq!(&*session.get_frame(n).unwrap(), &expected[n]);
        }
    }
}

#[test]
fn prerendered_cache_agrees_with_foreground() {
    let mut rng = StdRng::seed_from_u64(99);
    let bytes = random_gif(&mut rng);
    let expected = sequential(&bytes);

    let mut session = Session::load(
        &bytes,
        Arc::new(FakeDecoder::default()),
        TimelineOptions::default().key_frame_interval(2),
    )
    .unwrap();
    session
        .prerender(Retention::KeyFrames)
        .unwrap()
        .block_until_done();

    for (n, frame) in expected.iter().enumerate().rev() {
        assert_eq!(&*session.get_frame(n).unwrap(), frame);
    }
}

#[test]
fn truncation_never_panics() {
    let mut rng = StdRng::seed_from_u64(5);
    let bytes = random_gif(&mut rng);

    for len in 0..bytes.len() {
        match parse(&bytes[..len]) {
            Ok(container) => assert!(!container.frames.is_empty()),
            Err(Error::MalformedContainer { offset, reason }) => {
                assert!(offset <= len, "{reason} at {offset} past {len}");
                assert!(!matches!(reason, Malformation::UnknownBlock(_)));
            }
            Err(err) => panic!("unexpected error {err}"),
        }
    }
}
