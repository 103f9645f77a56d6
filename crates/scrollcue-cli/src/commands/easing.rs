use anyhow::Result;

use scrollcue_core::Easing;

pub fn run(name: &str, samples: usize) -> Result<()> {
    let easing: Easing = name.parse()?;
    let width = 40.0;

    println!("{} ({} samples)\n", easing, samples);
    for (t, value) in sample(easing, samples) {
        let bar = ((value.clamp(-0.5, 1.5) + 0.5) / 2.0 * width).round() as usize;
        println!("  t={:.3}  {:>7.4}  {}", t, value, "#".repeat(bar));
    }
    Ok(())
}

/// `samples + 1` evenly spaced points including both ends
pub fn sample(easing: Easing, samples: usize) -> Vec<(f64, f64)> {
    let samples = samples.max(1);
    (0..=samples)
        .map(|i| {
            let t = i as f64 / samples as f64;
            (t, easing.apply(t))
        })
        .collect()
}
