mod extract;
mod fetch;
mod reshape;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;
