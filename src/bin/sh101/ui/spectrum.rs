//! Spectrum analyzer widget
//!
//! FFT of the analyzer tap, read out at log-spaced frequencies.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Number of frequency bins to display
const SPECTRUM_BINS: usize = 48;

const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    /// FFT bin read for each displayed point
    bin_indices: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (log10 frequency, magnitude dB)
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    /// `size` must match the length of the buffers passed to `update`.
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);

        let denom = (size - 1) as f32;
        let window = (0..size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let nyquist = f64::from(sample_rate / 2.0).clamp(40.0, 20_000.0);
        let (lo, hi) = (20f64.log10(), nyquist.log10());
        let last_bin = size / 2 - 1;

        let mut bin_indices = Vec::with_capacity(SPECTRUM_BINS);
        let mut spectrum = Vec::with_capacity(SPECTRUM_BINS);
        for i in 0..SPECTRUM_BINS {
            let log_freq = lo + (hi - lo) * i as f64 / (SPECTRUM_BINS - 1) as f64;
            let bin = (10f64.powf(log_freq) * size as f64 / f64::from(sample_rate)).round();
            bin_indices.push((bin as usize).min(last_bin));
            spectrum.push((log_freq, FLOOR_DB));
        }

        Self {
            window,
            bin_indices,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); size],
            spectrum,
        }
    }

    /// Recompute from new samples; buffers of the wrong length are skipped.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for ((_, magnitude_db), &index) in self.spectrum.iter_mut().zip(&self.bin_indices) {
            let power = self.scratch[index].norm_sqr().max(1e-12);
            *magnitude_db = (10.0 * f64::from(power).log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(spectrum);

    let (lo, hi) = match (spectrum.first(), spectrum.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => (first.0, last.0),
        _ => (0.0, 1.0),
    };
    let max_db = spectrum.iter().map(|(_, db)| *db).fold(FLOOR_DB, f64::max);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([lo, hi])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, max_db.max(0.0) + 10.0])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
