//! ASCII line chart in the style of `asciigraph`.
//!
//! The grid is a matrix of cells; y axis labels are written as a single
//! wide cell so the axis column lines up at `offset - 1`.

const DEFAULT_OFFSET: usize = 3;

/// One cell for the label, one for the axis
const MIN_OFFSET: usize = 2;

/// Layout parameters for [`plot`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions<'a> {
    /// Chart rows; 0 derives the height from the value range
    pub height: usize,
    /// Columns the series is interpolated to; 0 plots every point
    pub width: usize,
    pub offset: usize,
    pub precision: usize,
    pub caption: &'a str,
}

/// Linearly resamples `data` to exactly `fit_count` points, keeping both ends.
pub fn interpolate(data: &[f64], fit_count: usize) -> Vec<f64> {
    match (data.len(), fit_count) {
        (0, _) | (_, 0) => Vec::new(),
        (_, 1) => vec![data[data.len() - 1]],
        (1, _) => vec![data[0]; fit_count],
        _ => {
            let spring_factor = (data.len() - 1) as f64 / (fit_count - 1) as f64;
            let mut out = Vec::with_capacity(fit_count);
            out.push(data[0]);
            for i in 1..fit_count - 1 {
                let spring = i as f64 * spring_factor;
                let before = spring.floor();
                let after = spring.ceil();
                let at_point = spring - before;
                let (lo, hi) = (data[before as usize], data[after as usize]);
                out.push(lo + (hi - lo) * at_point);
            }
            out.push(data[data.len() - 1]);
            out
        },
    }
}

fn min_max(series: &[f64]) -> (f64, f64) {
    series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Renders `series` as a multi-line chart followed by the caption line.
///
/// Non-finite values are dropped. An empty series yields only the caption.
pub fn plot(series: &[f64], options: &PlotOptions<'_>) -> String {
    let finite: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return options.caption.to_string();
    }

    let series = if options.width > 0 {
        interpolate(&finite, options.width)
    } else {
        finite
    };

    let (minimum, maximum) = min_max(&series);
    let interval = (maximum - minimum).abs();

    let height = if options.height > 0 {
        options.height as f64
    } else if interval < 1.0 {
        let scaled = interval * 10f64.powf((-interval.log10()).ceil());
        if scaled.is_finite() {
            scaled.trunc()
        } else {
            0.0
        }
    } else {
        interval.trunc()
    };
    let offset = if options.offset == 0 {
        DEFAULT_OFFSET
    } else {
        options.offset.max(MIN_OFFSET)
    };

    let ratio = if interval != 0.0 {
        height / interval
    } else {
        1.0
    };
    let min2 = (minimum * ratio).round() as i64;
    let max2 = (maximum * ratio).round() as i64;
    let rows = (max2 - min2).unsigned_abs() as usize;
    let width = series.len() + offset;

    let mut grid: Vec<Vec<String>> = vec![vec![" ".to_string(); width]; rows + 1];

    let mut precision = options.precision;
    let log_maximum = if minimum == 0.0 && maximum == 0.0 {
        -1.0
    } else {
        maximum.abs().max(minimum.abs()).log10()
    };
    if log_maximum < 0.0 {
        if log_maximum % 1.0 != 0.0 {
            precision += log_maximum.abs() as usize;
        } else {
            precision += (log_maximum.abs() - 1.0) as usize;
        }
    } else if log_maximum > 2.0 {
        precision = 0;
    }

    let max_len = format!("{maximum:.precision$}").len();
    let min_len = format!("{minimum:.precision$}").len();
    let label_width = max_len.max(min_len);

    for y in min2..=max2 {
        let magnitude = if rows > 0 {
            maximum - ((y - min2) as f64 * interval / rows as f64)
        } else {
            y as f64
        };
        let label = format!(
            "{magnitude:>w$.precision$}",
            w = label_width + 1
        );
        let row = (y - min2) as usize;
        let col = offset.saturating_sub(label.len());
        grid[row][col] = label;
        grid[row][offset - 1] = if y == 0 { "┼" } else { "┤" }.to_string();
    }

    let level = |v: f64| ((v * ratio).round() as i64 - min2) as usize;

    grid[rows - level(series[0])][offset - 1] = "┼".to_string();

    for (x, pair) in series.windows(2).enumerate() {
        let (y0, y1) = (level(pair[0]), level(pair[1]));
        let col = x + offset;

        if y0 == y1 {
            grid[rows - y0][col] = "─".to_string();
            continue;
        }

        let (end_glyph, start_glyph) = if y0 > y1 { ("╰", "╮") } else { ("╭", "╯") };
        grid[rows - y1][col] = end_glyph.to_string();
        grid[rows - y0][col] = start_glyph.to_string();

        for y in y0.min(y1) + 1..y0.max(y1) {
            grid[rows - y][col] = "│".to_string();
        }
    }

    let mut lines: Vec<String> = grid
        .iter()
        .map(|row| {
            let last = row.iter().rposition(|cell| cell != " ").unwrap_or(0);
            row[..=last].concat()
        })
        .collect();

    if !options.caption.is_empty() {
        let caption_len = options.caption.chars().count();
        let mut line = " ".repeat(offset + label_width);
        if caption_len < series.len() {
            line.push_str(&" ".repeat((series.len() - caption_len) / 2));
        }
        line.push_str(options.caption);
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn options(height: usize, width: usize, caption: &str) -> PlotOptions<'_> {
        PlotOptions {
            height,
            width,
            offset: 3,
            precision: 0,
            caption,
        }
    }

    #[test]
    fn test_rising_series_layout() {
        let chart = plot(&[1.0, 2.0, 3.0], &options(2, 0, "abc"));
        assert_eq!(chart, "  3┤ ╭\n  2┤╭╯\n  1┼╯\n    abc");
    }

    #[test]
    fn test_falling_series_layout() {
        let chart = plot(&[3.0, 1.0], &options(2, 0, ""));
        assert_eq!(chart, "  3┼╮\n  2┤│\n  1┤╰");
    }

    #[test]
    fn test_flat_series_is_single_row() {
        let chart = plot(&[5.0, 5.0, 5.0], &options(10, 0, ""));
        assert_eq!(chart.lines().count(), 1);
        assert!(chart.contains("┼──"));
    }

    #[test]
    fn test_height_sets_row_count() {
        let series: Vec<f64> = (0..50).map(|i| (i as f64).sin() * 10.0 + 20.0).collect();
        let chart = plot(&series, &options(15, 40, "caption"));
        // 15 rows plus the zero-based top row, then the caption
        assert_eq!(chart.lines().count(), 17);
        assert_eq!(chart.lines().last().unwrap().trim(), "caption");
    }

    #[test]
    fn test_width_interpolates_columns() {
        let chart = plot(&[0.0, 10.0], &options(5, 20, ""));
        let top = chart.lines().next().unwrap();
        // " 10" label cell, one blank, the axis, then 19 segments
        assert_eq!(top.chars().count(), 24);
        assert_eq!(chart.lines().count(), 6);
    }

    #[test]
    fn test_empty_series_prints_caption_only() {
        assert_eq!(plot(&[], &options(10, 40, "nothing yet")), "nothing yet");
        assert_eq!(plot(&[f64::NAN], &options(10, 40, "")), "");
    }

    #[test]
    fn test_narrow_offset_keeps_labels() {
        let narrow = PlotOptions {
            offset: 1,
            ..options(2, 0, "")
        };
        let chart = plot(&[1.0, 2.0, 3.0], &narrow);

        assert_eq!(chart, " 3┤ ╭\n 2┤╭╯\n 1┼╯");
        let two = PlotOptions {
            offset: 2,
            ..options(2, 0, "")
        };
        assert_eq!(chart, plot(&[1.0, 2.0, 3.0], &two));
    }

    #[test]
    fn test_precision_labels() {
        let opts = PlotOptions {
            precision: 2,
            ..options(2, 0, "")
        };
        let chart = plot(&[1.5, 2.5], &opts);
        assert!(chart.starts_with(" 2.50 ┤"), "{chart}");
    }

    #[rstest]
    #[case(&[1.0, 2.0, 3.0], 5, vec![1.0, 1.5, 2.0, 2.5, 3.0])]
    #[case(&[4.0], 3, vec![4.0, 4.0, 4.0])]
    #[case(&[1.0, 9.0], 1, vec![9.0])]
    #[case(&[1.0, 3.0, 5.0, 7.0, 9.0], 3, vec![1.0, 5.0, 9.0])]
    fn test_interpolate(#[case] data: &[f64], #[case] fit: usize, #[case] expected: Vec<f64>) {
        assert_eq!(interpolate(data, fit), expected);
    }
}
