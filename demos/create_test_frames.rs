use circlecam::{FrameSource, SyntheticScene};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let dir = PathBuf::from("test_frames");
    std::fs::create_dir_all(&dir)?;

    // Six rolling balls on a grey-blue cloth, two seconds at 30 fps
    let mut scene = SyntheticScene::new(640, 480, 6, 42).with_limit(60);
    let mut written = 0;
    while let Some(frame) = scene.next_frame()? {
        written += 1;
        frame
            .save(dir.join(format!("frame_{:04}.png", written)))
            .map_err(|e| anyhow::anyhow!("Failed to save frame: {}", e))?;
    }

    println!("Created {} frames (640x480) in {}", written, dir.display());
    println!("Play them with: circlecam pool-ball --input {}", dir.display());
    Ok(())
}
