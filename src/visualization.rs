//! # Visualization
//!
//! $$
//! \{(\sigma_p^{(k)}, \mu_p^{(k)})\}_{k=1}^N \mapsto \text{frontier scatter},\qquad
//! \sigma \mapsto r_f + S\sigma \mapsto \text{allocation lines}
//! $$
//!
//! Plotly charts of the frontier search and the allocation lines.

use plotly::color::NamedColor;
use plotly::common::DashType;
use plotly::common::Line;
use plotly::common::Marker;
use plotly::common::MarkerSymbol;
use plotly::common::Mode;
use plotly::layout::Axis;
use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;

use crate::quant::allocation::CapitalAllocationLine;
use crate::quant::portfolio::SamplingOutcome;

const CAL_POINTS: usize = 100;

fn layout(title: &str, x: &str, y: &str) -> Layout {
  Layout::new()
    .title(title)
    .auto_size(true)
    .x_axis(Axis::new().title(x))
    .y_axis(Axis::new().title(y))
}

/// Risk/return scatter of every sampled portfolio with the max-Sharpe
/// candidate highlighted. Only the best point is drawn when the outcome
/// carries no sample set.
pub fn frontier_plot(outcome: &SamplingOutcome) -> Plot {
  let mut plot = Plot::new();
  plot.set_layout(layout("Efficient Frontier", "Volatility", "Return"));

  if let Some(samples) = &outcome.samples {
    let vol: Vec<f64> = samples.iter().map(|s| s.volatility).collect();
    let ret: Vec<f64> = samples.iter().map(|s| s.expected_return).collect();
    let hover: Vec<String> = samples
      .iter()
      .map(|s| format!("Sharpe: {:.4}", s.sharpe_ratio))
      .collect();

    plot.add_trace(
      Scatter::new(vol, ret)
        .mode(Mode::Markers)
        .name("Portfolios")
        .marker(Marker::new().size(4).opacity(0.6))
        .hover_text_array(hover),
    );
  }

  let best = &outcome.best;
  plot.add_trace(
    Scatter::new(vec![best.volatility], vec![best.expected_return])
      .mode(Mode::Markers)
      .name(format!("Max Sharpe ({:.2})", best.sharpe_ratio).as_str())
      .marker(
        Marker::new()
          .size(14)
          .symbol(MarkerSymbol::Star)
          .color(NamedColor::Red),
      ),
  );

  plot
}

/// One line per allocation line, each drawn out to twice its risky
/// position's volatility.
pub fn allocation_lines_plot(lines: &[CapitalAllocationLine]) -> Plot {
  let mut plot = Plot::new();
  plot.set_layout(layout(
    "Capital Allocation Lines",
    "Standard Deviation",
    "Expected Return",
  ));

  if let Some(first) = lines.first() {
    let max_sigma = lines
      .iter()
      .fold(0.0_f64, |m, l| m.max(2.0 * l.volatility));
    plot.add_trace(
      Scatter::new(vec![0.0, max_sigma], vec![first.risk_free_rate; 2])
        .mode(Mode::Lines)
        .name("Risk-Free Rate")
        .line(Line::new().dash(DashType::Dash).color(NamedColor::Gray)),
    );
  }

  for cal in lines {
    let (x, y): (Vec<f64>, Vec<f64>) = cal
      .points(CAL_POINTS, 2.0 * cal.volatility)
      .into_iter()
      .unzip();
    plot.add_trace(
      Scatter::new(x, y)
        .mode(Mode::Lines)
        .name(format!("{} CAL (Sharpe: {:.2})", cal.id, cal.sharpe_ratio).as_str()),
    );
  }

  plot
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;
  use crate::quant::portfolio::PortfolioSampler;

  #[test]
  fn frontier_plot_has_cloud_and_best_point() {
    let mu = array![0.10, 0.08];
    let cov = array![[0.04, 0.01], [0.01, 0.03]];
    let outcome = PortfolioSampler::new(50, 0.01, true, false)
      .sample(&mu, &cov, Some(5))
      .unwrap();

    let json = frontier_plot(&outcome).to_json();
    assert!(json.contains("Portfolios"));
    assert!(json.contains("Max Sharpe"));
    assert!(json.contains("\"red\""));
  }

  #[test]
  fn allocation_plot_draws_every_line() {
    let returns = [0.01, -0.02, 0.015, 0.005];
    let lines = vec![
      CapitalAllocationLine::from_returns("AAA", &returns, 0.01, 252.0).unwrap(),
      CapitalAllocationLine::from_returns("BBB", &[0.008, -0.01, 0.012, 0.003], 0.01, 252.0)
        .unwrap(),
    ];

    let json = allocation_lines_plot(&lines).to_json();
    assert!(json.contains("AAA CAL"));
    assert!(json.contains("BBB CAL"));
    assert!(json.contains("Risk-Free Rate"));
    assert!(json.contains("\"gray\""));
  }
}
