#[tokio::main]
async fn main() {
    evote::start_server().await;
}
