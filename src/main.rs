//!   adsb-track:   ADS-B 1090ES decoder and aircraft tracker
//!
//!  Reads a raw sample capture or a frame recording, decodes it and
//!  reports the aircraft seen.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::sync::Arc;

use crossbeam_channel::{Sender, bounded};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use adsb_track::config::{Config, Input};
use adsb_track::pipeline::{Consumer, ProducerStats, Published, run_producer};
use adsb_track::replay::Pacer;
use adsb_track::{
    AircraftDatabase, AircraftRegistry, AnyAircraft, Demodulator, FrameReplay, FrameSource,
    MemoryDatabase, Message,
};

/// Read buffer in front of the input file.
const READ_BUFFER_LEN: usize = 16 * 16384;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_args();

    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    info!("adsb-track starting");
    debug!("Configuration: {:?}", config);

    let Some(input) = config.input.clone() else {
        error!("no input given, use --ifile or --replay");
        return Err("no input".into());
    };

    let database: Box<dyn AircraftDatabase + Send> = match &config.aircraft_db {
        Some(path) => Box::new(MemoryDatabase::open(path)?),
        None => Box::new(AnyAircraft),
    };

    let (msg_tx, msg_rx) = bounded(config.queue_capacity);
    let consumer = Consumer::new(msg_rx, AircraftRegistry::new(database), config.batch);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(run(&config, input, msg_tx, consumer));

    // A producer blocked on stdin must not hold up exit.
    rt.shutdown_background();
    result
}

async fn run<D: AircraftDatabase>(
    config: &Config,
    input: Input,
    msg_tx: Sender<Message>,
    mut consumer: Consumer<D>,
) -> Result<(), Box<dyn std::error::Error>> {
    let published = consumer.published();

    let realtime = config.is_realtime();
    let producer: JoinHandle<adsb_track::Result<ProducerStats>> =
        tokio::task::spawn_blocking(move || {
            let mut source = open_source(&input)?;
            let pacer = realtime.then(Pacer::new);
            run_producer(source.as_mut(), &msg_tx, pacer.as_ref())
        });

    let mut ticker = tokio::time::interval(config.tick);
    let mut stats = tokio::time::interval(config.stats_interval);
    stats.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                consumer.tick()?;
                if consumer.is_finished() {
                    break;
                }
            }
            _ = stats.tick() => report(&published, config.json)?,
            _ = &mut ctrl_c => {
                info!("interrupted, shutting down");
                return report(&published, config.json);
            }
        }
    }

    match producer.await {
        Ok(Ok(stats)) => info!(frames = stats.frames, messages = stats.messages, "producer done"),
        Ok(Err(e)) => error!("Error reading input: {}", e),
        Err(e) => error!("Producer task failed: {}", e),
    }
    report(&published, config.json)
}

fn open_source(input: &Input) -> adsb_track::Result<Box<dyn FrameSource>> {
    let (path, replay) = match input {
        Input::Samples(path) => (path, false),
        Input::Replay(path) => (path, true),
    };

    let file: Box<dyn Read> = if path == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(path)?)
    };
    let reader = BufReader::with_capacity(READ_BUFFER_LEN, file);

    if replay {
        info!("Replaying frames from: {}", path);
        Ok(Box::new(FrameReplay::new(reader)))
    } else {
        info!("Reading samples from: {}", path);
        Ok(Box::new(Demodulator::new(reader)?))
    }
}

fn report(published: &Arc<Published>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        messages = published.messages_received(),
        visible = published.visible_count(),
        "statistics"
    );
    if json {
        println!("{}", published.to_json()?);
    }
    Ok(())
}
