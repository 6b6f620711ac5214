use mockall::mock;
use rvsim_machine::common::InvalidRegister;
use rvsim_machine::csr::CsrId;
use rvsim_machine::csr::events::CsrObserver;

mock! {
    pub Observer {}
    impl CsrObserver for Observer {
        fn csr_written(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister>;
        fn csr_read(&mut self, id: CsrId, value: u64) -> Result<(), InvalidRegister>;
        fn tick(&mut self);
    }
}
