use std::io::{self, Write};
use std::path::Path;

use crate::sim::TickRecord;

/// Write trajectory data to CSV format.
///
/// Columns: time, angle_deg, angular_velocity, angular_acceleration,
///          position, velocity, torque, output, error, disturbance
pub fn write_trajectory<W: Write>(writer: &mut W, trajectory: &[TickRecord]) -> io::Result<()> {
    writeln!(
        writer,
        "time,angle_deg,angular_velocity,angular_acceleration,\
         position,velocity,torque,output,error,disturbance"
    )?;

    for r in trajectory {
        let s = &r.state;
        writeln!(
            writer,
            "{:.4},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            r.time,
            s.angle_degrees,
            s.angular_velocity,
            s.angular_acceleration,
            s.position,
            s.velocity,
            s.torque,
            r.output,
            r.error,
            r.disturbance,
        )?;
    }

    Ok(())
}

/// Write trajectory to a CSV file at the given path.
pub fn write_trajectory_file(path: &Path, trajectory: &[TickRecord]) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_trajectory(&mut file, trajectory)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RobotState;

    #[test]
    fn csv_output_has_header_and_rows() {
        let traj = vec![
            TickRecord {
                time: 0.0,
                state: RobotState::tilted(0.05).snapshot(),
                output: 0.0,
                error: -2.8648,
                disturbance: 0.0,
            },
            TickRecord {
                time: 0.02,
                state: RobotState::tilted(0.049).snapshot(),
                output: -6.1,
                error: -2.8075,
                disturbance: 0.0,
            },
        ];

        let mut buf = Vec::new();
        write_trajectory(&mut buf, &traj).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("time,angle_deg,"));
        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert!(lines[1].starts_with("0.0000,2.864"));
        assert_eq!(lines[2].split(',').count(), 10);
    }
}
