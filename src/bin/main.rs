use clap::Parser;

use modplayer::Player;

/// CLI based MOD player smoke test: loads a module and decodes frames
/// to exercise the whole pipeline without writing any audio output.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The module file to load
    path: String,

    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    #[arg(long, default_value_t = false)]
    stereo: bool,

    #[arg(long, default_value_t = 1.0)]
    stereo_width: f32,

    /// How many seconds of audio to decode
    #[arg(long, default_value_t = 5)]
    seconds: u32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut player = match Player::from_file(&args.path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("failed to load {}: {}", args.path, e);
            std::process::exit(1);
        }
    };

    player.set_sample_rate(args.sample_rate);
    player.set_stereo(args.stereo);
    player.set_stereo_width(args.stereo_width);

    println!(
        "loaded {:?}: {} channels, song length {}",
        player.module().name,
        player.module().num_channels,
        player.module().song_length
    );

    let output_channels = if args.stereo { 2 } else { 1 };
    let total_frames = args.sample_rate as usize * args.seconds as usize;
    let mut chunk = vec![0i16; 4096 * output_channels];
    let mut remaining = total_frames;

    while remaining > 0 {
        let frames = remaining.min(4096);
        let slice = &mut chunk[..frames * output_channels];
        player.decode_frames(slice);
        remaining -= frames;
    }

    let (position, line) = player.position();
    println!("decoded {} frames, ended at position {}, line {}", total_frames, position, line);
}
