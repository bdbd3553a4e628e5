#[tokio::main]
async fn main() {
    feedback::start_server().await;
}
