//! Prometheus text exposition format.
//!
//! Renders the binding set into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use crate::BindingSet;

/// Content type of [`render_prometheus`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render every binding's gauges into Prometheus text format.
///
/// A sensor that has not produced a reading yet gets its HELP and TYPE
/// lines but no sample.
pub fn render_prometheus(set: &BindingSet) -> String {
    let mut out = String::new();

    for binding in set.iter() {
        let current = binding.current();

        let t = binding.temperature();
        let _ = writeln!(out, "# HELP {} {}", t.name, t.help);
        let _ = writeln!(out, "# TYPE {} gauge", t.name);
        if let Some(r) = current {
            let _ = writeln!(out, "{} {}", t.name, r.temperature_celsius);
        }

        let c = binding.co2();
        let _ = writeln!(out, "# HELP {} {}", c.name, c.help);
        let _ = writeln!(out, "# TYPE {} gauge", c.name);
        if let Some(r) = current {
            let _ = writeln!(out, "{} {}", c.name, r.co2_ppm);
        }
    }

    out
}
