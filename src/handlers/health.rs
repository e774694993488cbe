/// Liveness probe for monitoring and load balancers. No session, no
/// database, just proof the process is serving.
pub async fn ping() -> &'static str {
    "OK"
}
