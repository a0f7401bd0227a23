mod bootstrap;

#[cfg(feature = "redis-test")]
mod ingress;
