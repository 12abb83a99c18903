use std::fs;
use std::io::{self, BufWriter, Write};

use super::AssemblyResult;
use crate::job::DownloadJob;
use crate::storage;

/// Appends every present segment file, in index order, into the output file.
///
/// Missing indices are skipped. The output is built at `<output>.part` and
/// renamed when complete.
pub fn concatenate(job: &DownloadJob) -> io::Result<AssemblyResult> {
    let output = job.output_path();
    let tmp = storage::temp_path(&output);
    let mut found = 0usize;
    {
        let mut out = BufWriter::new(fs::File::create(&tmp)?);
        for index in 0..job.segment_count {
            let path = job.segment_path(index);
            let mut seg = match fs::File::open(&path) {
                Ok(f) => f,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(job = %job.name, index, "gap skipped");
                    continue;
                }
                Err(e) => {
                    let _ = fs::remove_file(&tmp);
                    return Err(e);
                }
            };
            if let Err(e) = io::copy(&mut seg, &mut out) {
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
            found += 1;
        }
        out.flush()?;
    }
    if let Err(e) = fs::rename(&tmp, &output) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    let result = AssemblyResult::for_job(job, found);
    tracing::info!(
        job = %job.name,
        found,
        expected = job.segment_count,
        output = %output.display(),
        "segments concatenated"
    );
    Ok(result)
}
