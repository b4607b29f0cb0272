use common::error::FetchError;
use common::types::Transport;
use std::future::Future;
use std::time::Duration;

/// One try: which transport, and how long to wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub transport: Transport,
    pub timeout: Duration,
}

/// Ordered attempts for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    attempts: Vec<Attempt>,
}

impl FallbackPolicy {
    pub fn new(attempts: Vec<Attempt>) -> Self {
        Self { attempts }
    }

    pub fn direct(timeout: Duration) -> Self {
        Self::new(vec![Attempt {
            transport: Transport::Direct,
            timeout,
        }])
    }

    pub fn direct_then_relay(direct: Duration, relay: Duration) -> Self {
        Self::new(vec![
            Attempt {
                transport: Transport::Direct,
                timeout: direct,
            },
            Attempt {
                transport: Transport::Relay,
                timeout: relay,
            },
        ])
    }

    /// Run `op` once per attempt until one succeeds.
    ///
    /// Each call is cut off at the attempt's timeout. Transient errors
    /// (network, timeout) move on to the next attempt; any other error is
    /// returned immediately. On exhaustion the last error is returned.
    pub async fn run<T, F, Fut>(
        &self,
        endpoint: &'static str,
        mut op: F,
    ) -> Result<(T, Transport), FetchError>
    where
        F: FnMut(Transport, Duration) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut last_err = FetchError::NetworkFailure(format!("no attempts configured for {endpoint}"));

        for (i, attempt) in self.attempts.iter().enumerate() {
            let res = match tokio::time::timeout(
                attempt.timeout,
                op(attempt.transport, attempt.timeout),
            )
            .await
            {
                Ok(res) => res,
                Err(_elapsed) => Err(FetchError::Timeout(attempt.timeout)),
            };

            let outcome = match &res {
                Ok(_) => "ok",
                Err(e) => e.kind(),
            };
            metrics::counter!(
                "rank_checker_fallback_attempts_total",
                "endpoint" => endpoint,
                "transport" => attempt.transport.as_str(),
                "outcome" => outcome
            )
            .increment(1);

            match res {
                Ok(v) => return Ok((v, attempt.transport)),
                Err(e) if e.advances_fallback() => {
                    let remaining = self.attempts.len() - i - 1;
                    tracing::warn!(
                        endpoint,
                        transport = attempt.transport.as_str(),
                        error = %e,
                        remaining,
                        "attempt failed"
                    );
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err)
    }
}
