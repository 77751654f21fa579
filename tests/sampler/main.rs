mod motpe;
mod random;
