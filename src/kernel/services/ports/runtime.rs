use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub trait AsyncExecutor: Send + Sync {
    fn spawn(&self, task: BoxFuture<()>);
}
