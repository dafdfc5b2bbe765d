use anyhow::Result;
use canvas_clipper::audio::{AudioBlock, Oversampling};
use canvas_clipper::params::ParamValue;
use canvas_clipper::params::layout::{
    A_MIX, A_V, ANALOG_DRIVE, ANALOG_TYPE, DC_OFFSET, EVEN_AMOUNT, INPUT_GAIN, OUTPUT_GAIN,
    OVERSAMPLING, SATURATION_TYPE, SOFT_LIMIT_COEFFICIENT, TRANSFORMERIZE,
};
use canvas_clipper::processor::{ProcessConfig, Processor};
use canvas_clipper::state;
use std::thread;

const SAMPLE_RATE: usize = 48_000;
const BLOCK: usize = 256;

fn process(processor: &mut Processor, channels: &mut [Vec<f32>], inputs: usize) -> Result<()> {
    let mut views: Vec<&mut [f32]> = channels.iter_mut().map(Vec::as_mut_slice).collect();
    let mut block = AudioBlock::new(&mut views, inputs)?;
    processor.process(&mut block);
    Ok(())
}

#[test]
fn processor_passes_defaults_through() -> Result<()> {
    let mut processor = Processor::new()?;
    processor.prepare(ProcessConfig {
        sample_rate: SAMPLE_RATE,
        block_size: BLOCK,
        channels: 2,
    })?;

    let input: Vec<f32> = (0..BLOCK).map(|i| (i as f32 / BLOCK as f32) - 0.5).collect();
    let mut channels = vec![input.clone(), input.clone()];
    process(&mut processor, &mut channels, 2)?;

    assert_eq!(channels[0], input);
    assert_eq!(channels[1], input);
    Ok(())
}

#[test]
fn processor_saturates_and_pads_channels() -> Result<()> {
    let mut processor = Processor::new()?;
    let store = processor.parameters();
    store.set(INPUT_GAIN, 18.0)?;
    store.set(OUTPUT_GAIN, -6.0)?;
    store.set(SATURATION_TYPE, 1usize)?;

    let mut channels = vec![vec![0.5; 64], vec![0.9; 64]];
    process(&mut processor, &mut channels, 1)?;

    let ceiling = 10f32.powf(-6.0 / 20.0);
    assert!(channels[0].iter().all(|&s| (s - ceiling).abs() < 1e-6));
    assert!(channels[1].iter().all(|&s| s == 0.0));
    Ok(())
}

#[test]
fn processor_oversamples_when_prepared() -> Result<()> {
    let mut processor = Processor::new()?;
    processor.prepare(ProcessConfig {
        sample_rate: SAMPLE_RATE,
        block_size: BLOCK,
        channels: 1,
    })?;
    processor
        .parameters()
        .set(OVERSAMPLING, Oversampling::X4.index())?;

    let mut channels = vec![vec![0.1; BLOCK]];
    process(&mut processor, &mut channels, 1)?;

    assert_eq!(processor.oversampling_factor(), 4);
    assert_eq!(processor.engine().fallback_blocks(), 0);
    Ok(())
}

fn peak_index(samples: &[f32]) -> usize {
    samples
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |(best, peak), (i, &s)| {
            if s.abs() > peak { (i, s.abs()) } else { (best, peak) }
        })
        .0
}

#[test]
fn render_at_base_rate_is_exact() -> Result<()> {
    let mut processor = Processor::new()?;
    processor.prepare(ProcessConfig {
        sample_rate: SAMPLE_RATE,
        block_size: BLOCK,
        channels: 2,
    })?;
    assert_eq!(processor.latency_samples(), 0);

    // not a whole number of blocks
    let input: Vec<f32> = (0..1000).map(|i| ((i % 50) as f32 / 50.0) - 0.5).collect();
    let mut channels = vec![input.clone(), input.clone()];
    processor.render(&mut channels, BLOCK)?;

    assert_eq!(channels[0], input);
    assert_eq!(channels[1], input);
    Ok(())
}

#[test]
fn render_keeps_impulses_aligned_when_oversampled() -> Result<()> {
    let mut processor = Processor::new()?;
    processor.prepare(ProcessConfig {
        sample_rate: SAMPLE_RATE,
        block_size: BLOCK,
        channels: 1,
    })?;
    processor
        .parameters()
        .set(OVERSAMPLING, Oversampling::X2.index())?;
    assert!(processor.latency_samples() > 0);

    let frames = 2048;
    let late = frames - 20;
    let mut signal = vec![0.0f32; frames];
    signal[300] = 0.5;
    signal[late] = 0.5;
    let mut channels = vec![signal];
    processor.render(&mut channels, BLOCK)?;

    let output = &channels[0];
    assert_eq!(output.len(), frames);
    assert_eq!(processor.oversampling_factor(), 2);

    let early = peak_index(&output[..frames / 2]);
    assert!(early.abs_diff(300) <= 1, "impulse moved to {early}");
    assert!(output[early].abs() > 0.2);

    // the tail impulse only comes out of the flushed delay
    let tail = frames / 2 + peak_index(&output[frames / 2..]);
    assert!(tail.abs_diff(late) <= 1, "impulse moved to {tail}");
    assert!(output[tail].abs() > 0.2);
    Ok(())
}

#[test]
fn state_round_trips_between_processors() -> Result<()> {
    let source = Processor::new()?;
    let store = source.parameters();
    store.set(INPUT_GAIN, 7.5)?;
    store.set(OUTPUT_GAIN, -3.0)?;
    store.set(SATURATION_TYPE, 1usize)?;
    store.set(ANALOG_TYPE, 2usize)?;
    store.set(ANALOG_DRIVE, true)?;
    store.set(OVERSAMPLING, 1usize)?;
    store.set(SOFT_LIMIT_COEFFICIENT, 4.0)?;
    store.set(TRANSFORMERIZE, 0.75)?;
    store.set(EVEN_AMOUNT, 0.25)?;
    store.set(A_MIX, 0.5)?;
    store.set(A_V, 20.0)?;
    store.set(DC_OFFSET, 0.125)?;

    let blob = source.export_state()?;

    let restored = Processor::new()?;
    restored.import_state(&blob)?;

    assert_eq!(restored.parameters().export_all(), store.export_all());
    assert_eq!(restored.snapshot(), source.snapshot());
    Ok(())
}

#[test]
fn state_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.json");

    let source = Processor::new()?;
    source.parameters().set(A_V, 33.0)?;
    state::save_to_file(&path, &source.export_state()?)?;

    let restored = Processor::new()?;
    restored.import_state(&state::load_from_file(&path)?)?;
    assert_eq!(restored.parameters().get(A_V)?, ParamValue::Float(33.0));
    Ok(())
}

#[test]
fn partial_state_keeps_other_values() -> Result<()> {
    let processor = Processor::new()?;
    let store = processor.parameters();
    store.set(OUTPUT_GAIN, -9.0)?;

    let blob = br#"{
        "version": 1,
        "parameters": [
            {"key": "inputGain", "value": 40.0},
            {"key": "gainMatch", "value": true}
        ]
    }"#;
    processor.import_state(blob)?;

    assert_eq!(store.get(INPUT_GAIN)?, ParamValue::Float(18.0));
    assert_eq!(store.get(OUTPUT_GAIN)?, ParamValue::Float(-9.0));
    assert!(store.get("gainMatch").is_err());
    Ok(())
}

#[test]
fn garbage_state_leaves_values() -> Result<()> {
    let processor = Processor::new()?;
    let store = processor.parameters();
    store.set(A_MIX, 0.3)?;
    let before = store.export_all();

    assert!(processor.import_state(&[0xff, 0x00, 0x13]).is_err());
    assert_eq!(store.export_all(), before);
    Ok(())
}

#[test]
fn control_thread_writes_reach_next_block() -> Result<()> {
    let mut processor = Processor::new()?;
    let store = processor.parameters();

    thread::spawn(move || -> Result<()> {
        store.set(SATURATION_TYPE, 1usize)?;
        store.set(INPUT_GAIN, 18.0)?;
        Ok(())
    })
    .join()
    .map_err(|_| anyhow::anyhow!("control thread panicked"))??;

    let mut channels = vec![vec![0.25; 32]];
    process(&mut processor, &mut channels, 1)?;
    assert!(channels[0].iter().all(|&s| s == 1.0));
    Ok(())
}
