pub mod fixture;


#[cfg(test)]
mod column_reader;

#[cfg(test)]
mod legacy_padding;



#[cfg(test)]
mod scanner;
