use anyhow::{Context, Result};
use canvas_clipper::audio::Oversampling;
use canvas_clipper::params::ParameterStore;
use canvas_clipper::params::layout::{
    A_MIX, A_V, ANALOG_DRIVE, ANALOG_TYPE, DC_OFFSET, INPUT_GAIN, OUTPUT_GAIN, OVERSAMPLING,
    SATURATION_TYPE,
};
use canvas_clipper::processor::{ChannelSet, ProcessConfig, Processor, is_layout_supported};
use canvas_clipper::saturator::stages::common::lin_to_db;
use canvas_clipper::saturator::{AnalogType, SaturationType};
use canvas_clipper::settings::Settings;
use canvas_clipper::state;
use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "canvas-clipper")]
#[command(version)]
#[command(about = "Run a WAV file through the CanvasClipper saturator.")]
struct Args {
    /// WAV file to process
    input: PathBuf,

    #[arg(short, long, help = "Output WAV file (default: timestamped name)")]
    output: Option<PathBuf>,

    #[arg(long, env = "CANVAS_CLIPPER_STATE", help = "State blob to load")]
    state: Option<PathBuf>,

    #[arg(long, help = "Write the final parameter state to this file")]
    save_state: Option<PathBuf>,

    #[arg(long, allow_hyphen_values = true, help = "Input gain in dB (0 to 18)")]
    input_gain: Option<f32>,

    #[arg(long, allow_hyphen_values = true, help = "Output gain in dB (-18 to 12)")]
    output_gain: Option<f32>,

    #[arg(long, value_enum)]
    saturation: Option<SaturationType>,

    #[arg(long, value_enum)]
    analog: Option<AnalogType>,

    #[arg(long)]
    analog_drive: Option<bool>,

    #[arg(long, value_enum)]
    oversampling: Option<Oversampling>,

    #[arg(long, help = "Soft clip blend (0 to 1)")]
    a_mix: Option<f32>,

    #[arg(long, help = "Soft clip drive (0 to 50)")]
    a_v: Option<f32>,

    #[arg(long, help = "Soft clip DC shift (0 to 1)")]
    dc_offset: Option<f32>,

    #[arg(long, help = "Frames per processing block")]
    block_size: Option<usize>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    info!("CanvasClipper v{}", env!("CARGO_PKG_VERSION"));
    debug!("Args: {args:?}");

    let settings = Settings::load().context("failed to load settings")?;
    debug!("{settings}");

    let mut processor = Processor::new()?;
    let store = processor.parameters();

    store.set(OVERSAMPLING, settings.audio.oversampling.index())?;

    let state_path = args
        .state
        .clone()
        .or_else(|| settings.default_state.as_ref().map(PathBuf::from));
    if let Some(path) = &state_path {
        let blob = state::load_from_file(path)?;
        processor
            .import_state(&blob)
            .with_context(|| format!("failed to apply state from {}", path.display()))?;
    }

    apply_overrides(&store, &args)?;

    for key in store.keys() {
        info!("{key} = {}", store.display(key)?);
    }

    let (mut channels, spec) = read_wav(&args.input)?;
    let channel_count = channels.len();
    let layout = ChannelSet::from_count(channel_count);
    if !is_layout_supported(layout, layout) {
        anyhow::bail!("{channel_count} channel input is not supported, expected mono or stereo");
    }

    let block_size = args
        .block_size
        .unwrap_or(settings.audio.block_size as usize)
        .max(1);

    processor.prepare(ProcessConfig {
        sample_rate: spec.sample_rate as usize,
        block_size,
        channels: channel_count,
    })?;

    let latency = processor.latency_samples();
    if latency > 0 {
        debug!("Compensating {latency} frames of oversampling delay");
    }
    processor.render(&mut channels, block_size)?;

    if processor.engine().fallback_blocks() > 0 {
        warn!(
            "{} blocks could not be oversampled and ran at the base rate",
            processor.engine().fallback_blocks()
        );
    }

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "saturated_{}.wav",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ))
    });
    write_wav(&output, &channels, spec.sample_rate)?;

    let peak = channels
        .iter()
        .flatten()
        .fold(0.0f32, |peak, s| peak.max(s.abs()));
    info!(
        "Wrote {} ({:.1} dBFS peak)",
        output.display(),
        lin_to_db(peak)
    );

    if let Some(path) = &args.save_state {
        state::save_to_file(path, &processor.export_state()?)?;
        info!("Saved state to {}", path.display());
    }

    Ok(())
}

fn apply_overrides(store: &ParameterStore, args: &Args) -> Result<()> {
    if let Some(db) = args.input_gain {
        store.set(INPUT_GAIN, db)?;
    }
    if let Some(db) = args.output_gain {
        store.set(OUTPUT_GAIN, db)?;
    }
    if let Some(saturation) = args.saturation {
        store.set(SATURATION_TYPE, saturation.index())?;
    }
    if let Some(analog) = args.analog {
        store.set(ANALOG_TYPE, analog.index())?;
    }
    if let Some(drive) = args.analog_drive {
        store.set(ANALOG_DRIVE, drive)?;
    }
    if let Some(oversampling) = args.oversampling {
        store.set(OVERSAMPLING, oversampling.index())?;
    }
    if let Some(mix) = args.a_mix {
        store.set(A_MIX, mix)?;
    }
    if let Some(drive) = args.a_v {
        store.set(A_V, drive)?;
    }
    if let Some(offset) = args.dc_offset {
        store.set(DC_OFFSET, offset)?;
    }
    Ok(())
}

fn read_wav(path: &Path) -> Result<(Vec<Vec<f32>>, WavSpec)> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("failed to read float samples")?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()
                .context("failed to read integer samples")?
        }
    };

    let channel_count = usize::from(spec.channels);
    let frames = interleaved.len() / channel_count.max(1);
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in interleaved.chunks_exact(channel_count.max(1)) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    info!(
        "Read {} frames, {} channels at {} Hz from {}",
        frames,
        channel_count,
        spec.sample_rate,
        path.display()
    );
    Ok((channels, spec))
}

fn write_wav(path: &Path, channels: &[Vec<f32>], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let frames = channels.first().map_or(0, Vec::len);
    for i in 0..frames {
        for channel in channels {
            writer
                .write_sample(channel[i])
                .context("failed to write sample")?;
        }
    }

    writer.finalize().context("failed to finalize WAV file")?;
    Ok(())
}
