mod progress;
mod simulator;
