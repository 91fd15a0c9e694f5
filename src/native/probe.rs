use sysinfo::{Pid, Signal, System};

/// Samples one process through the OS process table.
#[derive(Debug)]
pub struct ProcessProbe {
    system: System,
    pid: Pid,
}

impl ProcessProbe {
    pub fn new(pid: u32) -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(pid),
        }
    }

    /// Current resident set size in bytes, `None` once the process can no
    /// longer be inspected.
    pub fn resident_bytes(&mut self) -> Option<u64> {
        if !self.system.refresh_process(self.pid) {
            return None;
        }
        self.system.process(self.pid).map(|process| process.memory())
    }

    /// Kills everything the process has spawned, deepest first.
    pub fn kill_descendants(&mut self) -> usize {
        self.system.refresh_processes();

        let mut descendants = vec![self.pid];
        let mut idx = 0;
        while idx < descendants.len() {
            let parent = descendants[idx];
            descendants.extend(
                self.system
                    .processes()
                    .iter()
                    .filter(|(_, process)| process.parent() == Some(parent))
                    .map(|(pid, _)| *pid),
            );
            idx += 1;
        }

        descendants
            .iter()
            .skip(1)
            .rev()
            .filter_map(|pid| self.system.process(*pid))
            .filter(|process| process.kill())
            .count()
    }

    /// Asks the process to stop. Returns `false` when the platform has no
    /// graceful termination signal or the process is already gone.
    pub fn terminate(&mut self) -> bool {
        if !self.system.refresh_process(self.pid) {
            return false;
        }
        self.system
            .process(self.pid)
            .and_then(|process| process.kill_with(Signal::Term))
            .unwrap_or(false)
    }
}
