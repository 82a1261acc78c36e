pub trait SimComponent {
    type SharedStatus;
    /// update the component, return(busy, updated)
    fn update(
        &mut self,
        shared_status: &mut Self::SharedStatus,
        current_cycle: usize,
    ) -> eyre::Result<(bool, bool)>;
}

/// steps a component until it reports that it is no longer busy
#[derive(Debug)]
pub struct SimRunner<T, S> {
    sim: T,
    shared_status: S,
    current_cycle: usize,
}
impl<T, S> SimRunner<T, S>
where
    T: SimComponent<SharedStatus = S>,
{
    pub fn new(sim: T, shared_status: S) -> SimRunner<T, S> {
        SimRunner {
            sim,
            current_cycle: 0,
            shared_status,
        }
    }
    pub fn run(&mut self) -> eyre::Result<()> {
        loop {
            let result = self.sim.update(&mut self.shared_status, self.current_cycle)?;
            match result {
                (true, true) => {
                    self.current_cycle += 1;
                }
                (true, false) => {
                    tracing::error!(
                        "simulation is busy but not updated at cycle {}",
                        self.current_cycle
                    );
                    return Err(eyre::eyre!(
                        "simulation is busy but not updated at cycle {}",
                        self.current_cycle
                    ));
                }
                (false, _) => {
                    // not busy, so we are done
                    break;
                }
            }
        }
        Ok(())
    }
    pub fn into_inner(self) -> (T, S, usize) {
        (self.sim, self.shared_status, self.current_cycle)
    }
}
