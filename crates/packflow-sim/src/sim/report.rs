use packflow::{LockerPool, LockerState, QueueDepths};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Columns per row in the closing locker grid.
const GRID_COLUMNS: usize = 20;

/// Writes the periodic status lines and the closing report.
///
/// Generic over the sink so the formatting is testable; production runs
/// write through a buffered file.
#[derive(Debug)]
pub struct StatusWriter<W> {
    out: W,
}

impl StatusWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> StatusWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// One snapshot line. Poison pills are already excluded from the transit
    /// and delivered counts by the core.
    pub fn status_line(&mut self, elapsed: Duration, depths: &QueueDepths) -> io::Result<()> {
        writeln!(
            self.out,
            "[{:>6} ms] preparation: {} | transit: {} | delivered: {} | failed: {} | verified: {}",
            elapsed.as_millis(),
            depths.preparation,
            depths.transit,
            depths.delivered,
            depths.failed,
            depths.verified,
        )?;
        self.out.flush()
    }

    /// The closing extended report: totals, locker health, and the grid.
    ///
    /// Each grid cell is a locker's lifetime occupancy count, or `#` for a
    /// locker that went out of service.
    pub fn final_report(&mut self, elapsed: Duration, pool: &LockerPool) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "[{:>6} ms] orders prepared: {} | faulted lockers: {} | functional lockers: {}",
            elapsed.as_millis(),
            pool.orders_prepared(),
            pool.faulted_lockers(),
            pool.functional_lockers(),
        )?;

        for row in pool.snapshot().chunks(GRID_COLUMNS) {
            let mut line = String::with_capacity(row.len() * 4);
            for cell in row {
                if cell.state == LockerState::OutOfService {
                    line.push_str(&format!("{:>4}", "#"));
                } else {
                    line.push_str(&format!("{:>4}", cell.occupancy));
                }
            }
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_format_is_stable() {
        let mut writer = StatusWriter::new(Vec::new());
        let depths = QueueDepths {
            preparation: 1,
            transit: 2,
            delivered: 3,
            failed: 4,
            verified: 5,
        };
        writer
            .status_line(Duration::from_millis(1234), &depths)
            .unwrap();
        assert_eq!(
            String::from_utf8(writer.out).unwrap(),
            "[  1234 ms] preparation: 1 | transit: 2 | delivered: 3 | failed: 4 | verified: 5\n"
        );
    }

    #[test]
    fn final_report_renders_the_grid() {
        let pool = LockerPool::new(3, 10);
        let order = pool.allocate().unwrap();
        pool.mark_faulted(&order).unwrap();

        let mut writer = StatusWriter::new(Vec::new());
        writer.final_report(Duration::from_millis(7), &pool).unwrap();
        let text = String::from_utf8(writer.out).unwrap();

        assert!(text.contains("orders prepared: 1"));
        assert!(text.contains("faulted lockers: 1 | functional lockers: 2"));
        // One row: the faulted locker prints as '#', the untouched ones as 0.
        let grid_row = text.lines().last().unwrap();
        assert_eq!(grid_row.matches('#').count(), 1);
        assert_eq!(grid_row.matches('0').count(), 2);
    }
}
