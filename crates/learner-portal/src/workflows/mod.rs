pub mod enrolment;
