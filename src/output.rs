//! Partitioning writer. One module per line, members ascending, largest
//! modules first, preceded by a `#` comment header with the run statistics.

use crate::graph::Network;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

pub fn write_partition(path: &Path, net: &Network, elapsed: Duration) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# mapseek partitioning")?;
    writeln!(out, "# nodes {}", net.node_count())?;
    writeln!(out, "# modules {}", net.partition().len())?;
    writeln!(out, "# flat entropy {}", net.flat_entropy())?;
    writeln!(out, "# hierarchical cost {}", net.hierarchical_cost())?;
    writeln!(out, "# elapsed {:.3}s", elapsed.as_secs_f64())?;

    let mut modules: Vec<Vec<u32>> = net
        .partition()
        .iter()
        .map(|m| {
            let mut members: Vec<u32> = m.members().iter().copied().collect();
            members.sort_unstable();
            members
        })
        .collect();
    modules.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.first().cmp(&b.first()))
    });

    for members in &modules {
        let line: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()
}
